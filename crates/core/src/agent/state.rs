use std::collections::VecDeque;

use local_agent_model::{
    ModelMessage, ModelRequest, ToolCallRequest, ToolCallResult,
};
use serde_json::{Deserializer, Map, Value};

use super::{
    Agent, AgentEvent, AgentOutcome, BUDGET_EXHAUSTED_MESSAGE, Termination,
};
use crate::conversation::Conversation;
use crate::model_client::ModelClientResponse;
use crate::tool::observation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AgentStage {
    #[default]
    AwaitingModel,
    AwaitingToolResult,
}

/// What a model turn asks the loop to do next.
enum Step {
    Continue,
    Finish(String),
    OutOfBudget,
}

/// Per-run state of an [`Agent`].
pub struct RunState<'a> {
    agent: &'a Agent,
    conversation: Conversation,
    current_stage: AgentStage,
    iterations: usize,
    pending_tool_calls: VecDeque<ToolCallRequest>,
}

impl<'a> RunState<'a> {
    pub fn new(agent: &'a Agent, task: String) -> Self {
        let mut conversation = Conversation::default();
        conversation.push(ModelMessage::User(task.clone()), task);
        Self {
            agent,
            conversation,
            current_stage: AgentStage::default(),
            iterations: 0,
            pending_tool_calls: VecDeque::new(),
        }
    }

    pub async fn run(mut self) -> AgentOutcome {
        loop {
            match self.current_stage {
                AgentStage::AwaitingModel => {
                    if self.iterations >= self.agent.max_iterations {
                        info!("iteration budget used up");
                        return self.finish(
                            BUDGET_EXHAUSTED_MESSAGE.to_owned(),
                            Termination::BudgetExhausted,
                        );
                    }
                    match self.call_model().await {
                        Step::Continue => {}
                        Step::Finish(text) => {
                            return self.finish(text, Termination::Completed);
                        }
                        Step::OutOfBudget => {
                            return self.finish(
                                BUDGET_EXHAUSTED_MESSAGE.to_owned(),
                                Termination::BudgetExhausted,
                            );
                        }
                    }
                }
                AgentStage::AwaitingToolResult => {
                    self.run_pending_tools().await;
                    self.current_stage = AgentStage::AwaitingModel;
                }
            }
        }
    }

    async fn call_model(&mut self) -> Step {
        self.iterations += 1;
        debug!("turn {} of {}", self.iterations, self.agent.max_iterations);
        self.agent.emit(AgentEvent::TurnStarted {
            iteration: self.iterations,
        });

        let request = self.build_model_request();
        let on_event = self.agent.on_event.clone();
        let resp = self
            .agent
            .model_client
            .send_request(request, move |delta| {
                if let Some(on_event) = &on_event {
                    on_event(&AgentEvent::TranscriptDelta(delta));
                }
            })
            .await;

        match resp {
            Ok(resp) => self.handle_response(resp),
            Err(err) => {
                warn!("model call failed: {err}");
                let text = format!("Error: {err}");
                self.agent.emit(AgentEvent::ModelError(text.clone()));
                self.conversation
                    .push(ModelMessage::Assistant(text.clone()), text);
                Step::Continue
            }
        }
    }

    fn handle_response(&mut self, resp: ModelClientResponse) -> Step {
        let ModelClientResponse {
            transcript,
            opaque_msg,
            tool_calls,
            ..
        } = resp;

        let msg = match opaque_msg {
            Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
            // Downgrade to a text-only message.
            None => ModelMessage::Assistant(transcript.clone()),
        };
        self.conversation.push(msg, transcript.clone());

        if tool_calls.is_empty() && !self.mentions_tool(&transcript) {
            return Step::Finish(transcript);
        }

        // Nothing the model asks for now would ever be seen by it.
        if self.iterations >= self.agent.max_iterations {
            info!("iteration budget used up, dropping the requested tools");
            return Step::OutOfBudget;
        }

        if !tool_calls.is_empty() {
            self.schedule_tools(tool_calls);
            return Step::Continue;
        }

        if let Some((name, arguments)) = extract_inline_tool_call(&transcript)
        {
            debug!("recovered an inline tool call to {name}");
            self.schedule_tools(vec![ToolCallRequest {
                id: format!("inline_{}", self.iterations),
                name,
                arguments,
            }]);
        } else {
            debug!("tool mentioned without a call, nudging the model");
            let hint = format!(
                "No tool was called. Available tools: {}. Call one of them \
                 if you need it, otherwise give your final answer.",
                self.agent.tool_executor.names().join(", ")
            );
            self.conversation.push(ModelMessage::User(hint.clone()), hint);
        }
        Step::Continue
    }

    #[inline]
    fn schedule_tools(&mut self, tool_calls: Vec<ToolCallRequest>) {
        self.pending_tool_calls.extend(tool_calls);
        self.current_stage = AgentStage::AwaitingToolResult;
    }

    #[inline]
    fn mentions_tool(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.agent
            .tool_indicators
            .iter()
            .any(|indicator| text.contains(indicator.as_str()))
    }

    async fn run_pending_tools(&mut self) {
        while let Some(call) = self.pending_tool_calls.pop_front() {
            self.agent.emit(AgentEvent::ToolCall(call.clone()));

            let result = self.agent.tool_executor.execute(&call).await;
            let observation = observation(&result);
            trace!("tool {} returned: {observation}", call.name);

            self.agent.emit(AgentEvent::ToolResult {
                name: call.name.clone(),
                observation: observation.clone(),
            });
            self.conversation.push(
                ModelMessage::Tool(ToolCallResult {
                    id: call.id,
                    name: call.name,
                    content: observation.clone(),
                }),
                observation,
            );
        }
    }

    fn build_model_request(&self) -> ModelRequest {
        let system = self
            .agent
            .system_prompt
            .iter()
            .map(|prompt| ModelMessage::System(prompt.clone()));
        let history = self.conversation.items.iter().map(|i| i.msg.clone());
        ModelRequest {
            messages: system.chain(history).collect(),
            tools: self.agent.tool_executor.definitions(),
            format: None,
        }
    }

    fn finish(self, text: String, termination: Termination) -> AgentOutcome {
        self.agent.emit(AgentEvent::Finished(termination));
        AgentOutcome {
            text,
            iterations: self.iterations,
            termination,
            conversation: self.conversation,
        }
    }
}

/// Finds a tool call written out as JSON inside plain text, like
/// `{"name": "calculate", "arguments": {"expression": "2 + 2"}}`.
///
/// `parameters` is accepted in place of `arguments`, and a missing
/// argument object means no arguments.
pub(crate) fn extract_inline_tool_call(text: &str) -> Option<(String, Value)> {
    text.match_indices('{').find_map(|(start, _)| {
        let value = Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()?
            .ok()?;
        let Value::Object(mut object) = value else {
            return None;
        };
        let Some(Value::String(name)) = object.remove("name") else {
            return None;
        };
        let arguments = match object
            .remove("arguments")
            .or_else(|| object.remove("parameters"))
        {
            Some(arguments @ Value::Object(_)) => arguments,
            // Some models encode the arguments as a JSON string.
            Some(Value::String(raw)) => serde_json::from_str(&raw).ok()?,
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(_) => return None,
        };
        Some((name, arguments))
    })
}
