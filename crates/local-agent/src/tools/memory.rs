use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, Mutex};

use local_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// An in-memory key/value store that lives as long as the process.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Returns all entries sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let Ok(entries) = self.entries.lock() else {
            return vec![];
        };
        let mut entries: Vec<_> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    fn insert(&self, key: String, value: String) -> Result<(), ToolError> {
        let mut entries = self.entries.lock().map_err(|_| {
            ToolError::execution_error().with_reason("memory store is poisoned")
        })?;
        entries.insert(key, value);
        Ok(())
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct WriteMemoryToolParameters {
    #[schemars(description = "The key to store.")]
    key: String,
    #[schemars(description = "The value to store.")]
    value: String,
}

/// A tool for writing key/value pairs into a [`MemoryStore`].
pub struct WriteMemoryTool {
    parameter_schema: Value,
    store: MemoryStore,
}

impl WriteMemoryTool {
    /// Creates a new memory tool writing into `store`.
    #[inline]
    pub fn new(store: MemoryStore) -> Self {
        WriteMemoryTool {
            parameter_schema: schema_for!(WriteMemoryToolParameters)
                .to_value(),
            store,
        }
    }
}

impl Tool for WriteMemoryTool {
    type Input = WriteMemoryToolParameters;

    fn name(&self) -> &str {
        "write_to_memory"
    }

    fn description(&self) -> &str {
        "Write a key-value pair to memory for later retrieval."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WriteMemoryToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let WriteMemoryToolParameters { key, value } = input;
        let message = format!("Stored '{key}' = '{value}' in memory.");
        ready(self.store.insert(key, value).map(|_| message))
    }
}
