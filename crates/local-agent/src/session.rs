use local_agent_core::{
    Agent, AgentBuilder, AgentEvent, AgentOutcome, ModelClient,
};
use local_agent_model::ModelProvider;

use crate::tools::*;

/// System instructions given to the tools agent.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant with access to tools.
When you need to use a tool, format your response to indicate which tool to use.
Always think step-by-step and use tools when appropriate.
After using tools, provide a clear final answer to the user.";

/// Words that keep the loop going when the model mentions them without
/// calling a tool.
pub const TOOL_INDICATORS: [&str; 5] =
    ["calculate", "time", "docker", "search", "memory"];

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    system_prompt: String,
    memory: MemoryStore,
    docker_tool: DockerStatusTool,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a session builder sharing an existing model client.
    pub fn with_model_client(model_client: ModelClient) -> Self {
        let agent_builder = AgentBuilder::with_model_client(model_client)
            .with_tool_indicators(TOOL_INDICATORS);
        Self {
            agent_builder,
            system_prompt: SYSTEM_PROMPT.to_owned(),
            memory: MemoryStore::new(),
            docker_tool: DockerStatusTool::new(),
        }
    }

    /// Replaces the default [`SYSTEM_PROMPT`].
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the maximum number of model calls per task.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent_builder =
            self.agent_builder.with_max_iterations(max_iterations);
        self
    }

    /// Makes `write_to_memory` write into `memory`.
    #[inline]
    pub fn with_memory(mut self, memory: MemoryStore) -> Self {
        self.memory = memory;
        self
    }

    /// Replaces the `check_docker_status` tool, for example to point it at
    /// another command.
    #[inline]
    pub fn with_docker_tool(mut self, tool: DockerStatusTool) -> Self {
        self.docker_tool = tool;
        self
    }

    /// Attaches a callback that observes the agent's progress.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&AgentEvent) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_event(on_event);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        let agent = self
            .agent_builder
            .with_system_prompt(self.system_prompt)
            .with_tool(CalculateTool::new())
            .with_tool(CurrentTimeTool::new())
            .with_tool(self.docker_tool)
            .with_tool(SearchDocumentationTool::new())
            .with_tool(WriteMemoryTool::new(self.memory.clone()))
            .build();

        Session {
            agent,
            memory: self.memory,
        }
    }
}

/// The tools agent: the bounded agent loop with the five built-in tools.
pub struct Session {
    agent: Agent,
    memory: MemoryStore,
}

impl Session {
    /// Runs one task in a fresh conversation.
    #[inline]
    pub async fn run(&self, task: &str) -> AgentOutcome {
        info!("running task: {task}");
        self.agent.run(task).await
    }

    /// Returns the iteration budget.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.agent.max_iterations()
    }

    /// Returns the names of the available tools.
    #[inline]
    pub fn tool_names(&self) -> Vec<&str> {
        self.agent.tool_names()
    }

    /// Returns the store written by `write_to_memory`.
    #[inline]
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use local_agent_core::Termination;
    use local_agent_model::{ModelMessage, Role, ToolCallRequest};
    use local_agent_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };
    use serde_json::{Value, json};

    use super::*;

    fn tool_call(name: &str, arguments: Value) -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: "call_0".to_owned(),
            name: name.to_owned(),
            arguments,
        })
    }

    #[tokio::test]
    async fn test_tools_registered() {
        let provider = TestModelProvider::default();
        let session = SessionBuilder::with_model_provider(provider).build();
        assert_eq!(
            session.tool_names(),
            [
                "calculate",
                "get_current_time",
                "check_docker_status",
                "search_documentation",
                "write_to_memory",
            ]
        );
        assert_eq!(session.max_iterations(), 5);
    }

    #[tokio::test]
    async fn test_calculate_round_trip() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([tool_call(
            "calculate",
            json!({ "expression": "65 * 3.5" }),
        )]));
        provider.add_response(PresetResponse::with_text(
            "The car travels 227.5 miles.",
        ));
        let observer = provider.clone();

        let session = SessionBuilder::with_model_provider(provider)
            .with_max_iterations(3)
            .build();
        let outcome = session.run("How far does a car go at 65 mph for 3.5 hours?").await;

        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.text, "The car travels 227.5 miles.");
        assert_eq!(outcome.conversation.items()[2].transcript(), "Result: 227.5");

        let first = &observer.requests()[0];
        assert_eq!(first.messages[0], ModelMessage::System(SYSTEM_PROMPT.to_owned()));
        assert_eq!(first.tools.len(), 5);
        assert_eq!(
            first.tools[0].parameters["required"],
            json!(["expression"])
        );
    }

    #[tokio::test]
    async fn test_memory_and_fallback() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text(
            r#"I'll store that in memory: {"name": "write_to_memory", "parameters": {"key": "last_check", "value": "09:05"}}"#,
        ));
        provider.add_response(PresetResponse::with_text("Saved."));
        let memory = MemoryStore::new();

        let session = SessionBuilder::with_model_provider(provider)
            .with_memory(memory.clone())
            .build();
        let outcome = session.run("Remember that I checked at 09:05.").await;

        assert_eq!(outcome.text, "Saved.");
        assert_eq!(memory.get("last_check").as_deref(), Some("09:05"));
        assert_eq!(session.memory().get("last_check").as_deref(), Some("09:05"));
        assert_eq!(outcome.conversation.items()[2].role(), Role::Tool);
    }

    #[tokio::test]
    async fn test_docker_tool_override() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([tool_call(
            "check_docker_status",
            Value::Null,
        )]));
        provider.add_response(PresetResponse::with_text("All good."));

        let session = SessionBuilder::with_model_provider(provider)
            .with_docker_tool(
                DockerStatusTool::new().with_command("sh", ["-c", "exit 3"]),
            )
            .build();
        let outcome = session.run("Is Docker up?").await;

        assert_eq!(
            outcome.conversation.items()[2].transcript(),
            "Docker is not running or not accessible."
        );
    }
}
