use std::collections::HashMap;

use local_agent_model::{ModelTool, ToolCallRequest};
use tracing::Instrument;

use crate::tool::{Error, ToolObject, ToolResult};

/// A fixed dispatch table that runs tool call requests from the model.
pub struct Executor {
    tools: Vec<Box<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Executor {
    /// Creates an executor over `tools`.
    ///
    /// A tool registered twice under the same name replaces the earlier one
    /// but keeps its position.
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut registered: Vec<Box<dyn ToolObject>> =
            Vec::with_capacity(tools.len());
        let mut index = HashMap::with_capacity(tools.len());
        for tool in tools {
            let name = tool.name().to_owned();
            match index.get(&name) {
                Some(&idx) => {
                    warn!("tool {name} registered twice, keeping the last one");
                    registered[idx] = tool;
                }
                None => {
                    index.insert(name, registered.len());
                    registered.push(tool);
                }
            }
        }
        Self {
            tools: registered,
            index,
        }
    }

    /// Definitions of all tools, in registration order.
    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    #[inline]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Runs one request to completion.
    pub async fn execute(&self, req: &ToolCallRequest) -> ToolResult {
        let Some(&idx) = self.index.get(&req.name) else {
            warn!("tool not found: {}", req.name);
            return Err(Error::not_found()
                .with_reason(format!("Unknown tool '{}'", req.name)));
        };
        trace!("running a tool ({}) with args: {:?}", req.id, req.arguments);
        let fut = self.tools[idx].execute(req.arguments.clone());
        fut.instrument(debug_span!("tool", name = %req.name)).await
    }
}

/// Renders a tool result the way it is shown to the model.
#[inline]
pub fn observation(result: &ToolResult) -> String {
    match result {
        Ok(output) => output.clone(),
        Err(err) => format!("Error: {}", err.reason()),
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{AnyTool, ErrorKind, Tool};

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool {
        name: &'static str,
        schema: Value,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                schema: json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }
        }
    }

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes the text back."
        }

        fn parameter_schema(&self) -> &Value {
            &self.schema
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(format!("{}: {}", self.name, input.text)))
        }
    }

    fn request(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_0".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[test]
    fn test_definitions_keep_order() {
        let executor = Executor::with_tools(vec![
            Box::new(AnyTool(EchoTool::new("zeta"))),
            Box::new(AnyTool(EchoTool::new("alpha"))),
            Box::new(AnyTool(EchoTool::new("zeta"))),
        ]);
        assert_eq!(executor.names(), ["zeta", "alpha"]);

        let definitions = executor.definitions();
        assert_eq!(definitions[1].name, "alpha");
        assert_eq!(definitions[1].description, "Echoes the text back.");
        assert_eq!(definitions[1].parameters["required"], json!(["text"]));
    }

    #[tokio::test]
    async fn test_execute() {
        let executor =
            Executor::with_tools(vec![Box::new(AnyTool(EchoTool::new("echo")))]);

        let result = executor
            .execute(&request("echo", json!({ "text": "hi" })))
            .await;
        assert_eq!(result, Ok("echo: hi".to_owned()));

        let result = executor.execute(&request("echo", json!({}))).await;
        assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(observation(&result).starts_with("Error: missing field"));

        let result = executor.execute(&request("read_file", json!({}))).await;
        assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(observation(&result), "Error: Unknown tool 'read_file'");
    }
}
