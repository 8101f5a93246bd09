mod builder;
mod state;

use std::sync::Arc;

use local_agent_model::ToolCallRequest;
use tracing::Instrument;

use crate::conversation::Conversation;
use crate::model_client::ModelClient;
use crate::tool::Executor as ToolExecutor;
pub use builder::AgentBuilder;
use state::RunState;

/// Iteration budget used when the builder doesn't set one.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Final text reported when a run is stopped by its iteration budget.
pub const BUDGET_EXHAUSTED_MESSAGE: &str = "Maximum iterations reached.";

pub(crate) type EventHandler = Arc<dyn Fn(&AgentEvent) + Send + Sync>;

/// A bounded, tool-augmented agent loop.
///
/// Each call to [`run`](Agent::run) starts a fresh conversation from the
/// task text and alternates between asking the model and running the tools
/// it asks for. The run ends with the first answer that doesn't ask for a
/// tool, or when the model has been called `max_iterations` times.
pub struct Agent {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    system_prompt: Option<String>,
    max_iterations: usize,
    tool_indicators: Vec<String>,
    on_event: Option<EventHandler>,
}

impl Agent {
    /// Returns the iteration budget of this agent.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the names of the registered tools.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_executor.names()
    }

    /// Runs the agent on `task` until it finishes.
    ///
    /// Never fails: model errors are recorded in the conversation and the
    /// loop goes on until the budget runs out.
    pub async fn run<S: Into<String>>(&self, task: S) -> AgentOutcome {
        RunState::new(self, task.into())
            .run()
            .instrument(debug_span!("agent run", budget = self.max_iterations))
            .await
    }

    #[inline]
    fn emit(&self, event: AgentEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(&event);
        }
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The model gave an answer without asking for a tool.
    Completed,
    /// The iteration budget was used up.
    BudgetExhausted,
}

/// The result of [`Agent::run`].
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    /// The final answer, or [`BUDGET_EXHAUSTED_MESSAGE`].
    pub text: String,
    /// Number of model calls made.
    pub iterations: usize,
    /// Why the run stopped.
    pub termination: Termination,
    /// Everything said during the run, starting with the task.
    pub conversation: Conversation,
}

/// Progress notifications sent to the observer of an [`Agent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    /// A model call is about to be made. `iteration` starts at 1.
    TurnStarted {
        /// The 1-based number of this model call.
        iteration: usize,
    },
    /// A piece of streamed model text.
    TranscriptDelta(String),
    /// The model asked for a tool.
    ToolCall(ToolCallRequest),
    /// A tool finished, `observation` is what the model will see.
    ToolResult {
        /// Name of the tool.
        name: String,
        /// The tool output or its error text.
        observation: String,
    },
    /// The model call failed. The message is also kept in the conversation.
    ModelError(String),
    /// The run is over.
    Finished(Termination),
}
