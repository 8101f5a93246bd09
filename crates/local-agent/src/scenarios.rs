//! Worked scenarios showing the tools agent, the ReAct runner and the
//! specialists on everyday tasks.

use std::sync::Arc;

use local_agent_core::{
    AgentEvent, AgentOutcome, ModelClient, ReActRunner, SpecialistTeam,
};

use crate::session::SessionBuilder;

/// What runs a [`Scenario`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Runner {
    /// The tools agent with the given iteration budget.
    Agent {
        /// Maximum number of model calls.
        max_iterations: usize,
    },
    /// A single ReAct completion.
    ReAct,
    /// One specialist.
    Specialist(&'static str),
    /// Several specialists asked in turn.
    Team(&'static [&'static str]),
}

/// A task together with the way to run it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scenario {
    /// Heading shown before the run.
    pub title: &'static str,
    /// The task text.
    pub task: &'static str,
    /// How the task is run.
    pub runner: Runner,
    /// Lines printed after the run.
    pub summary: &'static [&'static str],
}

/// All scenarios, in menu order.
pub static SCENARIOS: [Scenario; 10] = [
    Scenario {
        title: "Docker Troubleshooting Agent",
        task: "I'm having issues with my Docker setup. Can you help?\n\n\
               1. First, check if Docker is running\n\
               2. Search for documentation about common Docker issues\n\
               3. Tell me what time this troubleshooting session started",
        runner: Runner::Agent { max_iterations: 5 },
        summary: &[
            "The agent used multiple tools to help troubleshoot Docker issues.",
            "It checked Docker status, searched docs, and provided timestamp.",
        ],
    },
    Scenario {
        title: "Data Analysis Assistant",
        task: "I have quarterly sales data:\n\
               - Q1: $125,000\n\
               - Q2: $98,000\n\
               - Q3: $187,000\n\
               - Q4: $156,000\n\n\
               Calculate:\n\
               1. Total annual sales: 125000 + 98000 + 187000 + 156000\n\
               2. Average quarterly sales (divide total by 4)\n\
               3. Growth from Q1 to Q4 as percentage\n\n\
               Show all calculations.",
        runner: Runner::Agent { max_iterations: 4 },
        summary: &[
            "The agent performed multiple calculations and analyzed the data.",
        ],
    },
    Scenario {
        title: "Collaborative Code Development",
        task: "Create a Python function that:\n\
               1. Takes a list of numbers\n\
               2. Removes duplicates\n\
               3. Returns sorted list in descending order\n\n\
               Requirements:\n\
               - Include type hints\n\
               - Add docstring\n\
               - Handle edge cases (empty list, None)\n\
               - Make it efficient",
        runner: Runner::Team(&["coder", "debugger"]),
        summary: &[
            "Two specialists collaborated:",
            "- Coder: Created the initial implementation",
            "- Debugger: Reviewed for bugs and improvements",
        ],
    },
    Scenario {
        title: "Logic Puzzle with ReAct",
        task: "Three friends - Alice, Bob, and Carol - each have a different \
               pet.\n\n\
               Clues:\n\
               1. Alice doesn't have a dog\n\
               2. Bob doesn't have a cat\n\
               3. Carol has a bird\n\n\
               Who has which pet? (dog, cat, bird)",
        runner: Runner::ReAct,
        summary: &[
            "The agent used ReAct (Reasoning + Acting) to solve step-by-step.",
        ],
    },
    Scenario {
        title: "System Architecture Design",
        task: "Design a simple URL shortener service.\n\n\
               Include:\n\
               1. Main components (API, database, cache)\n\
               2. Data flow\n\
               3. Database schema\n\
               4. Key considerations (scaling, security)",
        runner: Runner::Specialist("architect"),
        summary: &[
            "The architect specialist provided a comprehensive system design.",
        ],
    },
    Scenario {
        title: "Research Assistant",
        task: "I'm learning about containerization. Can you help me \
               understand:\n\n\
               1. Search for documentation about Docker\n\
               2. Search for documentation about Ollama\n\
               3. Compare them and tell me how they relate to each other",
        runner: Runner::Agent { max_iterations: 4 },
        summary: &[
            "The agent searched multiple documentation sources and \
             synthesized findings.",
        ],
    },
    Scenario {
        title: "Math Tutor",
        task: "Help me solve this problem and show all steps:\n\n\
               If a car travels at 65 mph for 3.5 hours, how far does it \
               travel?\n\n\
               Calculate: 65 * 3.5\n\
               Then explain what this means in the context of the problem.",
        runner: Runner::Agent { max_iterations: 3 },
        summary: &["The agent used the calculator tool and explained the solution."],
    },
    Scenario {
        title: "Code Refactoring Team",
        task: "This code has security and style issues:\n\n\
               def get_user_data(id):\n\
               \x20   result = db.query(\"SELECT * FROM users WHERE id=\" + \
               str(id))\n\
               \x20   return result\n\n\
               Identify problems and provide improved version.",
        runner: Runner::Team(&["coder", "debugger"]),
        summary: &[
            "Multiple specialists identified:",
            "- SQL injection vulnerability",
            "- Missing error handling",
            "- No type hints",
            "- And provided secure, improved version",
        ],
    },
    Scenario {
        title: "Sequential Task Execution",
        task: "I need to complete several tasks in order:\n\n\
               1. Get the current time\n\
               2. Calculate how many hours until 5 PM (assume current time \
               is in result from step 1)\n\
               3. Search documentation for Docker\n\
               4. Check if Docker is running\n\
               5. Store in memory: \"last_check\" = current time\n\n\
               Execute all steps and provide a summary.",
        runner: Runner::Agent { max_iterations: 6 },
        summary: &[
            "The agent executed multiple tools in sequence to complete all \
             tasks.",
        ],
    },
    Scenario {
        title: "Error Recovery",
        task: "Try to calculate this: 10 / 0\n\n\
               When you encounter an error, explain what went wrong and \
               provide an alternative approach.",
        runner: Runner::Agent { max_iterations: 3 },
        summary: &[
            "The agent detected the division by zero error and explained it \
             properly.",
        ],
    },
];

/// The result of running a [`Scenario`].
#[derive(Clone, Debug)]
pub enum ScenarioOutput {
    /// Outcome of the tools agent.
    Agent(AgentOutcome),
    /// A single answer.
    Text(String),
    /// `(specialty, answer)` pairs.
    Team(Vec<(String, String)>),
}

/// Runs scenarios against one model.
#[derive(Clone)]
pub struct ScenarioRunner {
    model_client: ModelClient,
    on_event: Option<Arc<dyn Fn(&AgentEvent) + Send + Sync>>,
}

impl ScenarioRunner {
    /// Creates a runner sharing `model_client`.
    #[inline]
    pub fn new(model_client: ModelClient) -> Self {
        Self {
            model_client,
            on_event: None,
        }
    }

    /// Observes the tools agent of every agent scenario.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    /// Runs `scenario` to the end.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioOutput {
        info!("running scenario: {}", scenario.title);
        match scenario.runner {
            Runner::Agent { max_iterations } => {
                let mut builder =
                    SessionBuilder::with_model_client(self.model_client.clone())
                        .with_max_iterations(max_iterations);
                if let Some(on_event) = self.on_event.clone() {
                    builder = builder.on_event(move |event| on_event(event));
                }
                ScenarioOutput::Agent(builder.build().run(scenario.task).await)
            }
            Runner::ReAct => ScenarioOutput::Text(
                ReActRunner::with_model_client(self.model_client.clone())
                    .run(scenario.task)
                    .await,
            ),
            Runner::Specialist(specialty) => ScenarioOutput::Text(
                self.team().run_specialist(scenario.task, specialty).await,
            ),
            Runner::Team(specialists) => ScenarioOutput::Team(
                self.team().collaborate(scenario.task, specialists).await,
            ),
        }
    }

    #[inline]
    fn team(&self) -> SpecialistTeam {
        SpecialistTeam::with_model_client(self.model_client.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use local_agent_core::Termination;
    use local_agent_model::{ModelMessage, ToolCallRequest};
    use local_agent_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };
    use serde_json::json;

    use super::*;

    fn scenario(title: &str) -> &'static Scenario {
        SCENARIOS
            .iter()
            .find(|scenario| scenario.title == title)
            .unwrap()
    }

    #[test]
    fn test_scenario_table() {
        assert_eq!(SCENARIOS.len(), 10);
        assert_eq!(
            scenario("Sequential Task Execution").runner,
            Runner::Agent { max_iterations: 6 }
        );
        assert!(
            scenario("Code Refactoring Team")
                .task
                .contains("\n    result = db.query(\"SELECT * FROM users WHERE id=\" + str(id))\n")
        );
        assert!(SCENARIOS.iter().all(|scenario| !scenario.summary.is_empty()));
    }

    #[tokio::test]
    async fn test_math_tutor() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::ToolCall(ToolCallRequest {
                id: "call_0".to_owned(),
                name: "calculate".to_owned(),
                arguments: json!({ "expression": "65 * 3.5" }),
            }),
        ]));
        provider.add_response(PresetResponse::with_text(
            "65 * 3.5 = 227.5, so the car covers 227.5 miles.",
        ));

        let events = Arc::new(Mutex::new(Vec::new()));
        let runner = ScenarioRunner::new(ModelClient::new(provider)).on_event({
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event.clone())
        });
        let ScenarioOutput::Agent(outcome) =
            runner.run(scenario("Math Tutor")).await
        else {
            panic!("expected an agent outcome");
        };

        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.iterations, 2);
        assert!(events.lock().unwrap().contains(&AgentEvent::ToolResult {
            name: "calculate".to_owned(),
            observation: "Result: 227.5".to_owned(),
        }));
    }

    #[tokio::test]
    async fn test_error_recovery_budget() {
        let mut provider = TestModelProvider::default();
        for _ in 0..3 {
            provider.add_response(PresetResponse::with_text(
                "Let me calculate that again.",
            ));
        }
        let observer = provider.clone();

        let runner = ScenarioRunner::new(ModelClient::new(provider));
        let ScenarioOutput::Agent(outcome) =
            runner.run(scenario("Error Recovery")).await
        else {
            panic!("expected an agent outcome");
        };

        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(observer.request_count(), 3);
    }

    #[tokio::test]
    async fn test_specialist_scenarios() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Final Answer: ..."));
        provider.add_response(PresetResponse::with_text("API, DB, cache."));
        provider.add_response(PresetResponse::with_text("Use parameters."));
        provider.add_response(PresetResponse::with_text("Also handle errors."));
        let observer = provider.clone();
        let runner = ScenarioRunner::new(ModelClient::new(provider));

        let output = runner.run(scenario("Logic Puzzle with ReAct")).await;
        assert!(matches!(output, ScenarioOutput::Text(text) if text == "Final Answer: ..."));

        let output = runner.run(scenario("System Architecture Design")).await;
        assert!(matches!(output, ScenarioOutput::Text(text) if text == "API, DB, cache."));

        let ScenarioOutput::Team(answers) =
            runner.run(scenario("Code Refactoring Team")).await
        else {
            panic!("expected team answers");
        };
        assert_eq!(answers[0], ("coder".to_owned(), "Use parameters.".to_owned()));
        assert_eq!(answers[1].0, "debugger");

        let ModelMessage::User(prompt) = &observer.requests()[1].messages[0]
        else {
            panic!("expected a user prompt");
        };
        assert!(prompt.starts_with("You are a system architect."));
    }
}
