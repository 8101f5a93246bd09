//! Interactive menu over the tools agent, the ReAct runner and the
//! specialists.

use std::process::ExitCode;

use local_agent::console::{self, preview};
use local_agent::core::{DEFAULT_MAX_ITERATIONS, ModelClient};
use local_agent::demo::{self, AGENT_TEMPERATURE};
use owo_colors::OwoColorize;

const BASIC_TASKS: [&str; 3] = [
    "What is 156 * 89? Calculate this for me.",
    "What is the current time?",
    "Search for documentation about Docker.",
];

const REACT_TASK: &str = "A farmer has 17 sheep. All but 9 die. How many \
                          sheep does the farmer have left?";

const TEAM_TASK: &str =
    "Design a Python function to check if a string is a palindrome.";

const COMPLEX_TASK: &str = "I need to troubleshoot a Docker container that \
    can't pull images. \nFirst, check if Docker is running. Then search for \
    documentation about this issue. \nFinally, calculate how many hours of \
    downtime we've had if the issue started 3.5 hours ago.";

const TESTS: [&str; 4] = [
    "Basic Agent with Tools",
    "ReAct Reasoning Agent",
    "Multi-Agent Collaboration",
    "Complex Reasoning",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    demo::init_tracing();

    let provider = demo::provider_from_args(Some(AGENT_TEMPERATURE));
    let model_name = provider.config().model().to_owned();
    let model_client = ModelClient::new(provider);

    println!("{}", "Local Agent Test Program".bold().bright_cyan());
    println!("Model: {model_name}\n");

    println!("Available tests:");
    for (idx, name) in TESTS.iter().enumerate() {
        println!("  {}. {name}", idx + 1);
    }
    println!("  5. Run All Tests");
    println!("  6. Custom Task");
    println!();

    let Some(choice) = console::prompt("Select test (1-6): ").await else {
        return ExitCode::SUCCESS;
    };
    match choice.trim() {
        "1" => basic_agent(&model_client, &model_name).await,
        "2" => react_agent(&model_client).await,
        "3" => multi_agent(&model_client).await,
        "4" => complex_reasoning(&model_client, &model_name).await,
        "5" => run_all(&model_client, &model_name).await,
        "6" => custom_task(&model_client, &model_name).await,
        _ => println!("Invalid choice"),
    }
    ExitCode::SUCCESS
}

fn test_heading(number: usize, name: &str) {
    console::banner(&format!("TEST {number}: {name}"));
}

async fn basic_agent(model_client: &ModelClient, model_name: &str) {
    test_heading(1, TESTS[0]);
    for task in BASIC_TASKS {
        demo::run_agent(model_client, model_name, task, 3).await;
    }
}

async fn react_agent(model_client: &ModelClient) {
    test_heading(2, TESTS[1]);
    demo::run_react(model_client, REACT_TASK).await;
}

async fn multi_agent(model_client: &ModelClient) {
    test_heading(3, TESTS[2]);
    let results =
        demo::collaborate(model_client, TEAM_TASK, &["coder", "debugger"])
            .await;

    println!("\n{}", "Collaboration Summary:".bold().bright_green());
    println!("{}", console::rule('='));
    for (specialty, answer) in results {
        println!("\n{}", format!("{}:", specialty.to_uppercase()).bold());
        println!("{}", preview(&answer, console::PREVIEW_CHARS));
    }
}

async fn complex_reasoning(model_client: &ModelClient, model_name: &str) {
    test_heading(4, TESTS[3]);
    demo::run_agent(model_client, model_name, COMPLEX_TASK, 5).await;
}

async fn run_all(model_client: &ModelClient, model_name: &str) {
    console::banner(&format!(
        "LOCAL AGENT TEST SUITE\n  Model: {model_name}"
    ));

    for idx in 0..TESTS.len() {
        match idx {
            0 => basic_agent(model_client, model_name).await,
            1 => react_agent(model_client).await,
            2 => multi_agent(model_client).await,
            _ => complex_reasoning(model_client, model_name).await,
        }

        if idx + 1 < TESTS.len() {
            let message = "\nPress Enter to continue to next test...";
            if console::prompt(&message.bright_yellow().to_string())
                .await
                .is_none()
            {
                return;
            }
        }
    }

    println!("\n{}\n", "All tests completed!".bold().bright_green());
}

async fn custom_task(model_client: &ModelClient, model_name: &str) {
    let Some(task) = console::prompt("\nEnter your task: ").await else {
        return;
    };
    let task = task.trim();
    let Some(agent_type) =
        console::prompt("Agent type (basic/react/multi): ").await
    else {
        return;
    };

    match agent_type.trim().to_lowercase().as_str() {
        "react" => {
            demo::run_react(model_client, task).await;
        }
        "multi" => {
            let Some(specialists) = console::prompt(
                "Specialists (comma-separated, e.g., coder,debugger): ",
            )
            .await
            else {
                return;
            };
            let specialists = specialists
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>();
            demo::collaborate(model_client, task, &specialists).await;
        }
        _ => {
            demo::run_agent(
                model_client,
                model_name,
                task,
                DEFAULT_MAX_ITERATIONS,
            )
            .await;
        }
    }
}
