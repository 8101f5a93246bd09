//! Runs a fixed set of prompts against the model and reports how it did.
//!
//! ```text
//! prompt-suite              # full suite
//! prompt-suite quick [NAME] # one quick test, `hello_world` by default
//! prompt-suite list         # list the quick tests
//! ```

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;

use local_agent::console;
use local_agent::demo;
use local_agent::suite::{
    self, DEFAULT_QUICK_TEST, PROMPT_SUITE, PromptCase, QUICK_TESTS,
    SuiteResult, SuiteSummary,
};
use local_agent_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use owo_colors::OwoColorize;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    demo::init_tracing();

    println!("{}\n", "Model Prompt Suite".bold().bright_cyan());

    let provider = OllamaProvider::new(OllamaConfigBuilder::from_env().build());
    match provider.list_models().await {
        Ok(models) => {
            let names = models
                .iter()
                .map(|model| model.name.as_str())
                .collect::<Vec<_>>();
            println!("Available models: {}\n", names.join(", "));
        }
        Err(err) => {
            error!("cannot list models: {err}");
            console::print_error(&format!("Error connecting to Ollama: {err}"));
            println!("Make sure Ollama is running: docker compose up -d");
            return ExitCode::FAILURE;
        }
    }

    let args = env::args().skip(1).collect::<Vec<_>>();
    match args.first().map(String::as_str) {
        None => run_suite(&provider).await,
        Some("quick") => {
            let name = args.get(1).map_or(DEFAULT_QUICK_TEST, String::as_str);
            let Some(case) = suite::quick_test(name) else {
                println!("Unknown test: {name}");
                let names =
                    QUICK_TESTS.iter().map(|(name, _)| *name).collect::<Vec<_>>();
                println!("Available tests: {}", names.join(", "));
                return ExitCode::SUCCESS;
            };
            run_case(&provider, &case).await;
        }
        Some("list") => {
            println!("Available quick tests:");
            for (name, case) in QUICK_TESTS {
                println!("  - {name}: {}", case.description);
            }
        }
        Some(_) => print_usage(),
    }
    ExitCode::SUCCESS
}

fn print_usage() {
    println!("Usage:");
    println!("  prompt-suite              # Run full test suite");
    println!("  prompt-suite quick        # Run quick hello_world test");
    println!("  prompt-suite quick [name] # Run specific quick test");
    println!("  prompt-suite list         # List available quick tests");
}

async fn run_suite(provider: &OllamaProvider) {
    console::banner("MODEL COMPREHENSIVE TEST SUITE");

    let mut results = Vec::with_capacity(PROMPT_SUITE.len());
    for case in &PROMPT_SUITE {
        results.push(run_case(provider, case).await);
    }
    print_summary(&SuiteSummary::from_results(&results));
}

async fn run_case(provider: &OllamaProvider, case: &PromptCase) -> SuiteResult {
    println!("\n{}", console::rule('=').bold().bright_blue());
    println!("{}", format!("Category: {}", case.category).bold().bright_cyan());
    println!("{}", format!("Test: {}", case.description).yellow());
    println!("{}", console::rule('=').bold().bright_blue());
    println!("\n{} {}\n", "Prompt:".bright_green(), case.prompt);
    println!("{}", "Response:".bright_green());
    println!("{}", console::rule('-'));

    let result = suite::run_case(provider, case, console::print_delta).await;
    match &result.response {
        Ok(_) => {
            println!("\n{}", console::rule('-'));
            println!(
                "{}",
                format!(
                    "⏱ Completed in {:.2} seconds",
                    result.elapsed.as_secs_f64()
                )
                .bright_cyan()
            );
        }
        Err(err) => {
            println!();
            console::print_error(&format!("Error: {err}"));
        }
    }
    result
}

fn print_summary(summary: &SuiteSummary) {
    console::banner("TEST SUMMARY");

    println!("{} {}", "Total Tests:".bold(), summary.total);
    println!("{} {}", "Successful:".bright_green(), summary.successes);
    println!("{} {}", "Failed:".bright_red(), summary.failures());
    println!(
        "{} {:.2} seconds",
        "Total Time:".bright_cyan(),
        summary.total_time.as_secs_f64()
    );
    println!(
        "{} {:.2} seconds per test",
        "Average Time:".bright_cyan(),
        summary.average_time().as_secs_f64()
    );

    println!("\n{}", "Results by Category:".bold());
    for stats in &summary.categories {
        let status = if stats.all_passed() {
            "✓".bright_green().to_string()
        } else {
            "✗".bright_red().to_string()
        };
        println!(
            "  {status} {}: {}/{} ({:.0}%) - avg {:.2}s",
            stats.category,
            stats.successes,
            stats.total,
            stats.success_rate(),
            stats.average_time().as_secs_f64()
        );
    }

    println!("\n{}\n", "Testing complete!".bold().bright_green());
}
