//! Single-shot ReAct prompting.

use local_agent_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::model_client::ModelClient;

/// Asks the model to reason in Thought/Action/Observation steps and
/// finish with a final answer, all within one completion.
///
/// No tools are run, the model only imagines the observations.
#[derive(Clone)]
pub struct ReActRunner {
    model_client: ModelClient,
}

impl ReActRunner {
    /// Creates a runner over the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a runner sharing an existing model client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self { model_client }
    }

    /// Builds the prompt sent for `task`.
    pub fn prompt(task: &str) -> String {
        format!(
            "Solve this task using ReAct (Reasoning + Acting) format:\n\
             \n\
             Task: {task}\n\
             \n\
             Use this format:\n\
             Thought: [Your reasoning about what to do next]\n\
             Action: [The action you would take]\n\
             Observation: [What you would observe from that action]\n\
             ... (repeat Thought/Action/Observation as needed)\n\
             Thought: I now know the final answer\n\
             Final Answer: [Your final answer]\n\
             \n\
             Begin:"
        )
    }

    /// Runs `task` and returns the model's full answer.
    ///
    /// A failed model call is returned as `Error: <message>`.
    #[inline]
    pub async fn run(&self, task: &str) -> String {
        self.run_streaming(task, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_delta` with every streamed
    /// piece of text.
    pub async fn run_streaming(
        &self,
        task: &str,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> String {
        let request = ModelRequest::with_messages([ModelMessage::User(
            Self::prompt(task),
        )]);
        match self.model_client.send_request(request, on_delta).await {
            Ok(resp) => resp.transcript,
            Err(err) => {
                warn!("ReAct call failed: {err}");
                format!("Error: {err}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use local_agent_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[test]
    fn test_prompt() {
        let prompt = ReActRunner::prompt("How many sheep are left?");
        assert!(prompt.contains("Task: How many sheep are left?\n"));
        assert!(prompt.contains("\nObservation: [What you would observe"));
        assert!(prompt.ends_with("Final Answer: [Your final answer]\n\nBegin:"));
    }

    #[tokio::test]
    async fn test_run() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text(
            "Thought: I now know the final answer\nFinal Answer: 9",
        ));
        let observer = provider.clone();

        let runner = ReActRunner::new(provider);
        let answer = runner.run("All but 9 die.").await;
        assert!(answer.ends_with("Final Answer: 9"));

        let request = &observer.requests()[0];
        assert_eq!(
            request.messages,
            [ModelMessage::User(ReActRunner::prompt("All but 9 die."))]
        );
        assert!(request.tools.is_empty());

        let answer = runner.run("Again.").await;
        assert!(answer.starts_with("Error: "));
    }
}
