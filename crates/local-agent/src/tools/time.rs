use std::future::ready;

use chrono::Local;
use local_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Format of the timestamps returned by [`CurrentTimeTool`].
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize, JsonSchema)]
pub struct CurrentTimeToolParameters {}

/// A tool for reading the local wall clock.
pub struct CurrentTimeTool {
    parameter_schema: Value,
}

impl CurrentTimeTool {
    /// Creates a new current time tool.
    #[inline]
    pub fn new() -> Self {
        CurrentTimeTool {
            parameter_schema: schema_for!(CurrentTimeToolParameters)
                .to_value(),
        }
    }
}

impl Default for CurrentTimeTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurrentTimeTool {
    type Input = CurrentTimeToolParameters;

    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        _input: CurrentTimeToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(Local::now().format(TIME_FORMAT).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    #[tokio::test]
    async fn test_format() {
        let tool = CurrentTimeTool::new();
        let output = tool.execute(CurrentTimeToolParameters {}).await.unwrap();
        assert_eq!(output.len(), "2025-01-31 09:05:00".len());
        assert!(NaiveDateTime::parse_from_str(&output, TIME_FORMAT).is_ok());

        let schema = tool.parameter_schema();
        assert_eq!(schema["type"], "object");
    }
}
