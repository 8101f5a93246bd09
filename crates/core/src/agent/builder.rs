use std::sync::Arc;

use local_agent_model::ModelProvider;

use super::{Agent, AgentEvent, DEFAULT_MAX_ITERATIONS, EventHandler};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Executor as ToolExecutor, Tool, ToolObject};

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    max_iterations: usize,
    tools: Vec<Box<dyn ToolObject>>,
    tool_indicators: Vec<String>,
    on_event: Option<EventHandler>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a new builder sharing an existing model client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tools: vec![],
            tool_indicators: vec![],
            on_event: None,
        }
    }

    /// Sets the system instructions sent in front of every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum number of model calls per run.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        let tool = Box::new(AnyTool(tool));
        self.tools.push(tool);
        self
    }

    /// Sets the words that make the loop continue when the model mentions
    /// them without issuing a tool call. Matching ignores case.
    pub fn with_tool_indicators<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tool_indicators = indicators
            .into_iter()
            .map(|word| word.as_ref().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        self
    }

    /// Attaches an observer for [`AgentEvent`]s.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        let Self {
            model_client,
            system_prompt,
            max_iterations,
            tools,
            tool_indicators,
            on_event,
        } = self;

        Agent {
            model_client,
            tool_executor: ToolExecutor::with_tools(tools),
            system_prompt,
            max_iterations,
            tool_indicators,
            on_event,
        }
    }
}
