//! Worked scenarios for the tools agent, the ReAct runner and the
//! specialists.

use std::process::ExitCode;
use std::sync::Arc;

use local_agent::console::{self, ProgressReporter, Spinner};
use local_agent::core::{ModelClient, Termination};
use local_agent::demo::{self, AGENT_TEMPERATURE};
use local_agent::scenarios::{
    Runner, SCENARIOS, Scenario, ScenarioOutput, ScenarioRunner,
};
use owo_colors::OwoColorize;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    demo::init_tracing();

    let provider = demo::provider_from_args(Some(AGENT_TEMPERATURE));
    let model_name = provider.config().model().to_owned();

    let reporter = Arc::new(ProgressReporter::new());
    let runner = ScenarioRunner::new(ModelClient::new(provider))
        .on_event(move |event| reporter.handle(event));

    console::banner("LOCAL AGENT EXAMPLE SCENARIOS");
    println!("Model: {model_name}\n");
    for (idx, scenario) in SCENARIOS.iter().enumerate() {
        println!("  {:>2}. {}", idx + 1, scenario.title);
    }
    println!("   a. Run all examples");
    println!("   q. Quit\n");

    let Some(choice) = console::prompt("Select example (1-10, a, q): ").await
    else {
        return ExitCode::SUCCESS;
    };
    match choice.trim() {
        "q" | "Q" => {}
        "a" | "A" => {
            for (idx, scenario) in SCENARIOS.iter().enumerate() {
                run_scenario(&runner, idx + 1, scenario).await;
            }
            println!("\n{}\n", "All examples completed!".bold().bright_green());
        }
        choice => match choice
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=SCENARIOS.len()).contains(n))
        {
            Some(number) => {
                run_scenario(&runner, number, &SCENARIOS[number - 1]).await
            }
            None => println!("Invalid choice"),
        },
    }
    ExitCode::SUCCESS
}

async fn run_scenario(runner: &ScenarioRunner, number: usize, scenario: &Scenario) {
    console::section(&format!("Example {number}: {}", scenario.title));
    println!("\n{} {}\n", "Task:".bright_green(), scenario.task);

    // Agent runs draw their own progress.
    let spinner = match scenario.runner {
        Runner::Agent { .. } => None,
        _ => Some(Spinner::start("🤔 Thinking...")),
    };
    let output = runner.run(scenario).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }

    match output {
        ScenarioOutput::Agent(outcome) => {
            console::print_response("Response:", &outcome.text);
            let iterations = format!("Iterations: {}", outcome.iterations);
            if outcome.termination == Termination::BudgetExhausted {
                println!("{}", iterations.yellow());
            } else {
                println!("{}", iterations.bright_cyan());
            }
        }
        ScenarioOutput::Text(text) => console::print_response("Response:", &text),
        ScenarioOutput::Team(answers) => {
            for (specialty, answer) in answers {
                console::print_response(
                    &format!("Specialist: {}", specialty.to_uppercase()),
                    &answer,
                );
            }
        }
    }

    println!("\n{}", "Summary:".bright_green());
    for line in scenario.summary {
        println!("{line}");
    }
}
