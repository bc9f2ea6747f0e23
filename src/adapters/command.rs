//! Subprocess tool adapter.
//!
//! Runs a local command, passing the task parameters as JSON on stdin and
//! parsing the tool's stdout as a `ToolResponse`. Tools that print bare
//! (non-contract) JSON or plain text get their output wrapped into a
//! successful response, so simple scripts work without a shim.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{ToolAdapter, ToolResponse};

/// Tool adapter that shells out to a local command
pub struct CommandAdapter {
    /// Adapter name (usually the tool name)
    name: String,

    /// Program to invoke
    program: String,

    /// Fixed arguments prepended to every invocation
    args: Vec<String>,
}

impl CommandAdapter {
    /// Create a new command adapter
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    /// Spawn the command, feed params on stdin, and collect stdout
    async fn run_subprocess(
        &self,
        params: &Map<String, Value>,
        invocation_timeout: Duration,
    ) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn tool process '{}'", self.program))?;

        let input = serde_json::to_string(params)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .context("Failed to write params to tool stdin")?;
            // Drop stdin to signal EOF
        }

        let output = timeout(invocation_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Tool '{}' timed out after {:?}",
                    self.name, invocation_timeout
                )
            })?
            .with_context(|| format!("Failed to wait for tool process '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Tool '{}' exited with code {}: {}",
                self.name,
                exit_code,
                stderr.trim()
            );
        }

        let stdout =
            String::from_utf8(output.stdout).context("Tool output is not valid UTF-8")?;

        Ok(stdout)
    }

    /// Interpret raw stdout as a ToolResponse.
    ///
    /// Contract-shaped JSON is taken as-is; any other JSON becomes a
    /// successful payload; non-JSON text becomes a string payload.
    fn parse_output(stdout: &str) -> ToolResponse {
        let trimmed = stdout.trim();

        if let Ok(resp) = serde_json::from_str::<ToolResponse>(trimmed) {
            return resp;
        }
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return ToolResponse::ok(value);
        }
        ToolResponse::ok(Value::String(trimmed.to_string()))
    }
}

#[async_trait]
impl ToolAdapter for CommandAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        params: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<ToolResponse> {
        let stdout = self.run_subprocess(params, timeout).await?;
        Ok(Self::parse_output(&stdout))
    }

    async fn health_check(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--help")
            .output()
            .await
            .with_context(|| format!("Failed to run health check for '{}'", self.name))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Health check for '{}' failed: {}", self.name, stderr);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_contract_shaped_output() {
        let resp = CommandAdapter::parse_output(r#"{"success": false, "error": "no route"}"#);
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("no route"));
    }

    #[test]
    fn test_parse_bare_json_output() {
        let resp = CommandAdapter::parse_output(r#"{"open_ports": [22, 80]}"#);
        assert!(resp.success);
        assert_eq!(resp.result, json!({"open_ports": [22, 80]}));
    }

    #[test]
    fn test_parse_plain_text_output() {
        let resp = CommandAdapter::parse_output("example.com has address 93.184.216.34\n");
        assert!(resp.success);
        assert_eq!(
            resp.result,
            Value::String("example.com has address 93.184.216.34".to_string())
        );
    }

    #[tokio::test]
    async fn test_echo_roundtrip() {
        let adapter = CommandAdapter::new("echo", "cat", vec![]);
        let mut params = Map::new();
        params.insert("target".to_string(), json!("example.com"));

        let resp = adapter
            .execute(&params, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(resp.result, json!({"target": "example.com"}));
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let adapter = CommandAdapter::new("ghost", "/nonexistent/tool-binary", vec![]);
        let params = Map::new();
        let result = adapter.execute(&params, Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
