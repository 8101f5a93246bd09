//! Asks the model for JSON answers and picks them apart.

use std::process::ExitCode;

use local_agent::console;
use local_agent::demo;
use local_agent_ollama_model::OllamaProvider;
use serde_json::Value;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    demo::init_tracing();

    let provider = demo::provider_from_args(None);
    println!("--- Running Ollama Structured Response Tests ---");
    println!(
        "Using Ollama Model: {} at Host: {}",
        provider.config().model(),
        provider.config().host()
    );

    docker_explanation(&provider).await;
    llm_features(&provider).await;
    knight_story(&provider).await;

    println!("\n--- Ollama Structured Response Tests Complete ---");
    ExitCode::SUCCESS
}

async fn ask(
    provider: &OllamaProvider,
    prompt: &str,
    system_message: &str,
) -> Option<Value> {
    match provider.ask_structured(prompt, Some(system_message)).await {
        Ok(value) => {
            println!("Received structured response:");
            match serde_json::to_string_pretty(&value) {
                Ok(pretty) => println!("{pretty}"),
                Err(_) => println!("{value}"),
            }
            Some(value)
        }
        Err(err) => {
            console::print_error(&err.to_string());
            None
        }
    }
}

async fn docker_explanation(provider: &OllamaProvider) {
    println!("\n--- Test 1: Docker Explanation ---");
    let Some(answer) = ask(
        provider,
        "Explain Docker in one sentence, providing a concise summary and 3 \
         key benefits.",
        "Provide your answer in JSON format with two keys: 'summary' \
         (string) and 'benefits' (a list of 3 strings).",
    )
    .await
    else {
        return;
    };

    println!("Summary: {}", answer["summary"].as_str().unwrap_or("N/A"));
    println!("Benefits:");
    let benefits = answer["benefits"].as_array().map(Vec::as_slice);
    for (idx, benefit) in benefits.unwrap_or_default().iter().enumerate() {
        println!("  {}. {}", idx + 1, display(benefit));
    }
}

async fn llm_features(provider: &OllamaProvider) {
    println!("\n--- Test 2: LLM Features ---");
    let Some(answer) = ask(
        provider,
        "List 3 key features of Large Language Models (LLMs).",
        "Provide your answer in JSON format with a single key 'features' \
         which is a list of 3 strings.",
    )
    .await
    else {
        return;
    };

    match answer["features"].as_array() {
        Some(features) => {
            for (idx, feature) in features.iter().enumerate() {
                println!("  Feature {}: {}", idx + 1, display(feature));
            }
        }
        None => println!(
            "Response format mismatch: 'features' key not found or not a list."
        ),
    }
}

async fn knight_story(provider: &OllamaProvider) {
    println!("\n--- Test 3: Structured Story ---");
    let Some(answer) = ask(
        provider,
        "Tell me a short story about a brave knight named Sir Reginald, \
         summarizing the plot and listing the main characters.",
        "Your response must be in JSON format with keys 'title', 'summary', \
         and 'characters' (a list of strings).",
    )
    .await
    else {
        return;
    };

    println!("Title: {}", answer["title"].as_str().unwrap_or("N/A"));
    let characters = answer["characters"]
        .as_array()
        .map(|list| list.iter().map(display).collect::<Vec<_>>().join(", "))
        .unwrap_or_else(|| "N/A".to_owned());
    println!("Characters: {characters}");
}

/// Strings without quotes, anything else as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
