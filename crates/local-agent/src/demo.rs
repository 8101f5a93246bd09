//! Run-and-print routines shared by the demo programs.

use std::env;
use std::sync::Arc;

use local_agent_core::{
    AgentOutcome, ModelClient, ReActRunner, SpecialistTeam, Termination,
};
use local_agent_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use owo_colors::OwoColorize;

use crate::console::{self, ProgressReporter, Spinner};
use crate::session::SessionBuilder;

/// Sampling temperature used by the agent programs.
pub const AGENT_TEMPERATURE: f32 = 0.7;

/// Initializes logging from `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Builds a provider from the environment, with the first command line
/// argument, if any, as the model name.
pub fn provider_from_args(temperature: Option<f32>) -> OllamaProvider {
    let mut builder = OllamaConfigBuilder::from_env();
    if let Some(model) = env::args().nth(1) {
        builder = builder.with_model(model);
    }
    if let Some(temperature) = temperature {
        builder = builder.with_temperature(temperature);
    }
    let config = builder.build();
    debug!("using {} at {}", config.model(), config.host());
    OllamaProvider::new(config)
}

/// Runs the tools agent on `task` and prints its progress and answer.
pub async fn run_agent(
    model_client: &ModelClient,
    model_name: &str,
    task: &str,
    max_iterations: usize,
) -> AgentOutcome {
    console::section(&format!("Running Agent: {model_name}"));
    println!("\n{} {task}\n", "Task:".bright_green());

    let reporter = Arc::new(ProgressReporter::new());
    let session = SessionBuilder::with_model_client(model_client.clone())
        .with_max_iterations(max_iterations)
        .on_event(move |event| reporter.handle(event))
        .build();
    let outcome = session.run(task).await;

    console::print_response("Response:", &outcome.text);
    let iterations = format!("Iterations: {}", outcome.iterations);
    match outcome.termination {
        Termination::Completed => println!("{}\n", iterations.bright_cyan()),
        Termination::BudgetExhausted => {
            println!("{}\n", format!("{iterations} (budget used up)").yellow())
        }
    }
    outcome
}

/// Runs a ReAct completion, streaming the answer.
pub async fn run_react(model_client: &ModelClient, task: &str) -> String {
    println!("\n{}", "Simple ReAct Agent".bold().bright_blue());
    println!("{} {task}\n", "Task:".bright_green());
    println!("{}", "Response:".bright_green());
    println!("{}", console::rule('-'));

    let answer = ReActRunner::with_model_client(model_client.clone())
        .run_streaming(task, |delta| console::print_delta(&delta))
        .await;
    if answer.starts_with("Error: ") {
        console::print_error(&answer);
    }
    println!("\n{}", console::rule('-'));
    answer
}

/// Asks one specialist and prints the answer.
pub async fn run_specialist(
    model_client: &ModelClient,
    task: &str,
    specialty: &str,
) -> String {
    ask_specialist(
        &SpecialistTeam::with_model_client(model_client.clone()),
        task,
        specialty,
    )
    .await
}

/// Asks every specialist in turn, printing each answer.
pub async fn collaborate<S: AsRef<str>>(
    model_client: &ModelClient,
    task: &str,
    specialists: &[S],
) -> Vec<(String, String)> {
    console::banner("Multi-Agent Collaboration");

    let team = SpecialistTeam::with_model_client(model_client.clone());
    let mut results = Vec::with_capacity(specialists.len());
    for specialty in specialists {
        let specialty = specialty.as_ref();
        let answer = ask_specialist(&team, task, specialty).await;
        results.push((specialty.to_owned(), answer));
    }
    results
}

async fn ask_specialist(
    team: &SpecialistTeam,
    task: &str,
    specialty: &str,
) -> String {
    println!(
        "\n{}",
        format!("Specialist: {}", specialty.to_uppercase())
            .bold()
            .bright_yellow()
    );
    println!("{} {task}", "Task:".bright_green());

    let spinner = Spinner::start(format!("🤔 The {specialty} is thinking..."));
    let answer = team.run_specialist(task, specialty).await;
    spinner.finish();

    console::print_response("Response:", &answer);
    answer
}
