use std::future::ready;

use local_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Topics known to [`SearchDocumentationTool`], checked in this order.
pub const DOCUMENTATION: [(&str, &str); 4] = [
    (
        "docker",
        "Docker is a platform for developing, shipping, and running \
         applications in containers. Key commands: docker run, docker \
         build, docker ps.",
    ),
    (
        "ollama",
        "Ollama is a tool for running large language models locally. Use \
         'ollama pull' to download models and 'ollama run' to interact with \
         them.",
    ),
    (
        "langgraph",
        "LangGraph is a library for building stateful, multi-actor \
         applications with LLMs. It uses graphs to define agent workflows.",
    ),
    (
        "zscaler",
        "Zscaler is a cloud security platform. For Docker, add the Zscaler \
         root certificate to the container's trust store.",
    ),
];

#[derive(Deserialize, JsonSchema)]
pub struct SearchDocumentationToolParameters {
    #[schemars(description = "The search query.")]
    query: String,
}

/// A tool for looking up short notes from a fixed documentation table.
pub struct SearchDocumentationTool {
    parameter_schema: Value,
}

impl SearchDocumentationTool {
    /// Creates a new documentation search tool.
    #[inline]
    pub fn new() -> Self {
        SearchDocumentationTool {
            parameter_schema: schema_for!(SearchDocumentationToolParameters)
                .to_value(),
        }
    }
}

impl Default for SearchDocumentationTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SearchDocumentationTool {
    type Input = SearchDocumentationToolParameters;

    fn name(&self) -> &str {
        "search_documentation"
    }

    fn description(&self) -> &str {
        "Search documentation for a given query."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchDocumentationToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(search(&input.query)))
    }
}

/// Returns the note of the first topic mentioned in `query`.
pub fn search(query: &str) -> String {
    let query = query.to_lowercase();
    DOCUMENTATION
        .iter()
        .find(|(key, _)| query.contains(key))
        .map(|(key, text)| format!("Documentation for '{key}': {text}"))
        .unwrap_or_else(|| {
            "No documentation found for that query. Try: docker, ollama, \
             langgraph, or zscaler."
                .to_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search() {
        assert_eq!(
            search("How do I use Ollama?"),
            "Documentation for 'ollama': Ollama is a tool for running large \
             language models locally. Use 'ollama pull' to download models \
             and 'ollama run' to interact with them."
        );
        // Docker comes first in the table.
        assert!(
            search("zscaler certificates in DOCKER")
                .starts_with("Documentation for 'docker':")
        );
        assert_eq!(
            search("kubernetes"),
            "No documentation found for that query. Try: docker, ollama, \
             langgraph, or zscaler."
        );
    }
}
