//! A walk through the Ollama server: connection check, installed models,
//! pulling, text generation and chat.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;

use local_agent::console;
use local_agent::core::ModelClient;
use local_agent::demo;
use local_agent_model::{ModelMessage, ModelRequest};
use local_agent_ollama_model::{OllamaProvider, PullProgress};
use owo_colors::OwoColorize;

const CHAT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that provides concise answers.";

const FOLLOW_UPS: [&str; 2] = [
    "What is a Docker image?",
    "How is it different from a container?",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    demo::init_tracing();

    let provider = demo::provider_from_args(None);
    let model = provider.config().model().to_owned();

    println!("{}", console::rule('='));
    println!("Ollama Example Usage");
    println!("{}\n", console::rule('='));

    println!("1. Checking connection to Ollama...");
    if !provider.check_connection().await {
        console::print_error("Cannot connect to Ollama. Make sure it's running:");
        println!("   docker compose up -d");
        return ExitCode::FAILURE;
    }
    match provider.version().await {
        Ok(version) => println!("✓ Connected to Ollama {version}\n"),
        Err(_) => println!("✓ Connected to Ollama\n"),
    }

    println!("2. Listing available models...");
    let models = provider.list_models().await.unwrap_or_else(|err| {
        error!("cannot list models: {err}");
        println!("Error listing models: {err}");
        Vec::new()
    });
    if models.is_empty() {
        println!("⚠ No models found. Let's pull one!");
    } else {
        println!("✓ Found {} model(s):", models.len());
        for info in &models {
            println!("   - {} ({:.2} GB)", info.name, info.size_gib());
        }
    }
    println!();

    if !models.iter().any(|info| info.name.contains(&model)) {
        println!("3. Pulling {model} model...");
        if !pull(&provider, &model).await {
            console::print_error("Failed to pull model");
            return ExitCode::FAILURE;
        }
        println!();
    }

    generate_example(&provider, &model).await;

    let model_client = ModelClient::new(provider);
    chat_example(&model_client, &model).await;
    multi_turn_example(&model_client, &model).await;

    println!("{}", console::rule('='));
    println!("{}", "All examples completed!".bold().bright_green());
    println!("{}", console::rule('='));
    ExitCode::SUCCESS
}

async fn pull(provider: &OllamaProvider, model: &str) -> bool {
    println!("Pulling model: {model}");
    println!("This may take a few minutes...");

    let result = provider
        .pull_model(model, |progress: &PullProgress| {
            match progress.percent() {
                Some(percent) => {
                    print!("\r{}: {percent:.1}%", progress.status)
                }
                None => print!("\r{}", progress.status),
            }
            std::io::stdout().flush().ok();
        })
        .await;

    match result {
        Ok(()) => {
            println!("\n✓ Model pulled successfully!");
            true
        }
        Err(err) => {
            println!("\nError pulling model: {err}");
            false
        }
    }
}

fn example_heading(title: &str) {
    println!("{}", console::rule('='));
    println!("{title}");
    println!("{}", console::rule('='));
}

async fn generate_example(provider: &OllamaProvider, model: &str) {
    example_heading("Example 1: Simple Text Generation");

    let prompt = "Explain what Docker is in one sentence.";
    println!("\nPrompt: {prompt}");
    println!("{}", console::rule('-'));

    print!("\n{}: ", model.bright_cyan());
    if let Err(err) = provider.generate(prompt, console::print_delta).await {
        println!("Error generating response: {err}");
    }
    println!("\n");
}

/// Streams one chat answer, returning `None` when the call fails.
async fn chat(
    model_client: &ModelClient,
    model: &str,
    messages: &[ModelMessage],
) -> Option<String> {
    print!("\n{}: ", model.bright_cyan());
    let request = ModelRequest::with_messages(messages.to_vec());
    match model_client
        .send_request(request, |delta| console::print_delta(&delta))
        .await
    {
        Ok(resp) => {
            println!();
            Some(resp.transcript)
        }
        Err(err) => {
            println!("Error in chat: {err}");
            None
        }
    }
}

async fn chat_example(model_client: &ModelClient, model: &str) {
    example_heading("Example 2: Chat Conversation");

    let question = "What are the benefits of containerization?";
    println!("\nUser: {question}");
    println!("{}", console::rule('-'));

    let messages = [
        ModelMessage::System(CHAT_SYSTEM_PROMPT.to_owned()),
        ModelMessage::User(question.to_owned()),
    ];
    chat(model_client, model, &messages).await;
    println!();
}

async fn multi_turn_example(model_client: &ModelClient, model: &str) {
    example_heading("Example 3: Multi-turn Conversation");

    let mut messages = vec![ModelMessage::System(CHAT_SYSTEM_PROMPT.to_owned())];
    for question in FOLLOW_UPS {
        println!("\nUser: {question}");
        println!("{}", console::rule('-'));

        messages.push(ModelMessage::User(question.to_owned()));
        let Some(answer) = chat(model_client, model, &messages).await else {
            break;
        };
        messages.push(ModelMessage::Assistant(answer));
    }
    println!();
}
