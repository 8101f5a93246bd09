use std::io;
use std::time::Duration;

use local_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize, JsonSchema)]
pub struct DockerStatusToolParameters {}

/// A tool for checking whether the Docker daemon answers.
///
/// Runs `docker ps` and counts the listed containers.
pub struct DockerStatusTool {
    parameter_schema: Value,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl DockerStatusTool {
    /// Creates a new docker status tool.
    #[inline]
    pub fn new() -> Self {
        DockerStatusTool {
            parameter_schema: schema_for!(DockerStatusToolParameters)
                .to_value(),
            program: "docker".to_owned(),
            args: vec!["ps".to_owned()],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replaces the `docker ps` invocation.
    pub fn with_command<I, S>(mut self, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.to_owned();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how long the command may run before the check gives up.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DockerStatusTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DockerStatusTool {
    type Input = DockerStatusToolParameters;

    fn name(&self) -> &str {
        "check_docker_status"
    }

    fn description(&self) -> &str {
        "Check if Docker is running and how many containers are active."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        _input: DockerStatusToolParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        let limit = self.timeout;
        async move {
            let status = match timeout(limit, run_status_command(command)).await
            {
                Ok(Ok(status)) => status,
                Ok(Err(err)) => format!("Cannot check Docker status: {err}"),
                Err(_) => format!(
                    "Cannot check Docker status: timed out after {} seconds",
                    limit.as_secs_f64()
                ),
            };
            Ok(status)
        }
    }
}

async fn run_status_command(mut command: Command) -> Result<String, io::Error> {
    let output = command.output().await?;
    if !output.status.success() {
        debug!("docker ps exited with {}", output.status);
        return Ok("Docker is not running or not accessible.".to_owned());
    }

    // The first line is the table header.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let containers = stdout.trim().split('\n').count().saturating_sub(1);
    Ok(format!("Docker is running. {containers} container(s) active."))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check(tool: DockerStatusTool) -> String {
        tool.execute(DockerStatusToolParameters {}).await.unwrap()
    }

    #[tokio::test]
    async fn test_running() {
        let tool = DockerStatusTool::new().with_command(
            "sh",
            ["-c", "printf 'CONTAINER ID   IMAGE\\nabc   ollama\\ndef   redis\\n'"],
        );
        assert_eq!(check(tool).await, "Docker is running. 2 container(s) active.");

        let tool = DockerStatusTool::new()
            .with_command("sh", ["-c", "echo 'CONTAINER ID   IMAGE'"]);
        assert_eq!(check(tool).await, "Docker is running. 0 container(s) active.");
    }

    #[tokio::test]
    async fn test_not_running() {
        let tool = DockerStatusTool::new().with_command("sh", ["-c", "exit 1"]);
        assert_eq!(check(tool).await, "Docker is not running or not accessible.");
    }

    #[tokio::test]
    async fn test_cannot_check() {
        let tool = DockerStatusTool::new()
            .with_command("local-agent-no-such-program", Vec::<String>::new());
        assert!(check(tool).await.starts_with("Cannot check Docker status: "));

        let tool = DockerStatusTool::new()
            .with_command("sleep", ["5"])
            .with_timeout(Duration::from_millis(50));
        assert_eq!(
            check(tool).await,
            "Cannot check Docker status: timed out after 0.05 seconds"
        );
    }
}
