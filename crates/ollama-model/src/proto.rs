use local_agent_model::{
    ModelMessage, ModelRequest, ModelTool, ResponseFormat,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OllamaConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// One line of a streamed `/api/chat` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatChunk {
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    pub done_reason: Option<String>,
    pub error: Option<String>,
}

/// One line of a streamed `/api/generate` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<String>,
}

/// One line of a streamed `/api/pull` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PullChunk {
    #[serde(default)]
    pub status: String,
    pub total: Option<u64>,
    pub completed: Option<u64>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// A model installed on the server, as reported by `/api/tags`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    /// Model name including its tag, like `llama3.2:latest`.
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: u64,
    /// Last modification time as sent by the server.
    pub modified_at: Option<String>,
}

impl ModelInfo {
    /// Size on disk in GiB.
    #[inline]
    pub fn size_gib(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Progress reported while pulling a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullProgress {
    /// Status line, like `pulling manifest` or `success`.
    pub status: String,
    /// Total bytes of the layer being downloaded, if known.
    pub total: Option<u64>,
    /// Bytes downloaded so far, if known.
    pub completed: Option<u64>,
}

impl PullProgress {
    /// Completion ratio in percent, when the server reports sizes.
    pub fn percent(&self) -> Option<f64> {
        match (self.total, self.completed) {
            (Some(total), Some(completed)) if total > 0 => {
                Some(completed as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        content: String,
        tool_name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Options>,
    stream: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PullRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_chat_request(
    req: &ModelRequest,
    config: &OllamaConfig,
) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        format: req.format.map(|format| match format {
            ResponseFormat::Json => "json",
        }),
        options: create_options(config),
        stream: true,
    }
}

#[inline]
pub fn create_generate_request(
    prompt: &str,
    config: &OllamaConfig,
) -> GenerateRequest {
    GenerateRequest {
        model: config.model.clone(),
        prompt: prompt.to_owned(),
        options: create_options(config),
        stream: true,
    }
}

#[inline]
fn create_options(config: &OllamaConfig) -> Option<Options> {
    config.temperature.map(|temperature| Options {
        temperature: Some(temperature),
    })
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
            tool_calls: None,
        },
        ModelMessage::Tool(result) => Message::Tool {
            content: result.content.clone(),
            tool_name: result.name.clone(),
        },
        ModelMessage::Opaque(opaque_message) => {
            // Opaque messages from this provider always have `Message` type.
            let Some(msg) = opaque_message.to_raw::<Message>() else {
                return Message::Assistant {
                    content: String::new(),
                    tool_calls: None,
                };
            };
            msg.clone()
        }
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use local_agent_model::{OpaqueMessage, ToolCallResult};
    use serde_json::json;

    use super::*;
    use crate::OllamaConfigBuilder;

    #[test]
    fn test_create_chat_request() {
        let assistant_turn = Message::Assistant {
            content: String::new(),
            tool_calls: Some(vec![ToolCall {
                id: None,
                function: FunctionCall {
                    name: "calculate".to_owned(),
                    arguments: json!({ "expression": "65 * 3.5" }),
                },
            }]),
        };
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("You are a helpful assistant.".to_owned()),
                ModelMessage::User("How far?".to_owned()),
                ModelMessage::Opaque(OpaqueMessage::new(
                    "ollama:0",
                    assistant_turn,
                )),
                ModelMessage::Tool(ToolCallResult {
                    id: "call_0".to_owned(),
                    name: "calculate".to_owned(),
                    content: "Result: 227.5".to_owned(),
                }),
            ],
            tools: vec![ModelTool {
                name: "calculate".to_owned(),
                description: "Evaluates arithmetic.".to_owned(),
                parameters: json!({ "type": "object" }),
            }],
            format: None,
        };
        let config = OllamaConfigBuilder::new()
            .with_model("llama3.2")
            .with_temperature(0.5)
            .build();

        let body =
            serde_json::to_value(create_chat_request(&request, &config))
                .unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.2",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "How far?" },
                    {
                        "role": "assistant",
                        "content": "",
                        "tool_calls": [{
                            "function": {
                                "name": "calculate",
                                "arguments": { "expression": "65 * 3.5" }
                            }
                        }]
                    },
                    {
                        "role": "tool",
                        "content": "Result: 227.5",
                        "tool_name": "calculate"
                    }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "calculate",
                        "description": "Evaluates arithmetic.",
                        "parameters": { "type": "object" }
                    }
                }],
                "options": { "temperature": 0.5 },
                "stream": true
            })
        );
    }

    #[test]
    fn test_json_format() {
        let mut request = ModelRequest::with_messages([ModelMessage::User(
            "List 3 features.".to_owned(),
        )]);
        request.format = Some(ResponseFormat::Json);
        let config = OllamaConfigBuilder::new().build();

        let body =
            serde_json::to_value(create_chat_request(&request, &config))
                .unwrap();
        assert_eq!(body["format"], "json");
        assert!(body.get("tools").is_none());
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_pull_progress() {
        let chunk: PullChunk = serde_json::from_str(
            r#"{"status":"pulling 6a0746a1ec1a","digest":"sha256:6a07","total":200,"completed":50}"#,
        )
        .unwrap();
        let progress = PullProgress {
            status: chunk.status,
            total: chunk.total,
            completed: chunk.completed,
        };
        assert_eq!(progress.percent(), Some(25.0));

        let progress = PullProgress {
            status: "pulling manifest".to_owned(),
            total: None,
            completed: None,
        };
        assert_eq!(progress.percent(), None);
    }
}
