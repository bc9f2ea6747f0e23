//! Reasoning oracle interface.
//!
//! The oracle is a fallible external generative service used for ranking and
//! narrative synthesis. The engine never depends on it working: every caller
//! has a deterministic fallback (see `core::ranking` and `core::aggregator`).

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// A prompt-in, free-text-out generative service
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Complete a prompt. The reply is free text that is *hoped* to contain
    /// what the caller asked for; callers must validate it.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Oracle backed by a local generative CLI (prompt on stdin, reply on stdout)
pub struct CommandOracle {
    /// Path to the CLI binary
    binary_path: String,

    /// Invocation timeout
    timeout: Duration,
}

impl CommandOracle {
    /// Create an oracle with a custom binary path
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReasoningOracle for CommandOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn oracle '{}'", self.binary_path))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .context("Failed to write prompt to oracle stdin")?;
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("Oracle timed out after {:?}", self.timeout))?
            .context("Failed to wait for oracle process")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Oracle failed: {}", stderr.trim());
        }

        String::from_utf8(output.stdout).context("Oracle reply is not valid UTF-8")
    }
}

/// Oracle stand-in for oracle-less operation; every call fails, which routes
/// callers to their deterministic fallbacks
pub struct NullOracle;

#[async_trait]
impl ReasoningOracle for NullOracle {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("No reasoning oracle configured")
    }
}
