//! Adapter interfaces for external tools.
//!
//! Every tool, whatever its backend, is invoked through the same contract:
//! `execute(params) -> ToolResponse`. The engine treats any violation of
//! that shape as a tool-level failure eligible for failover.

pub mod command;
pub mod http;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use command::CommandAdapter;
pub use http::HttpAdapter;

/// Uniform response shape every tool adapter must produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the tool considers the invocation successful
    pub success: bool,

    /// Tool output payload (shape is tool-specific)
    #[serde(default)]
    pub result: Value,

    /// Error message when `success` is false
    #[serde(default)]
    pub error: Option<String>,

    /// Optional tool-provided metadata
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl ToolResponse {
    /// Build a successful response with just a payload
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result,
            error: None,
            metadata: None,
        }
    }

    /// Build a failed response carrying an error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(error.into()),
            metadata: None,
        }
    }
}

/// Trait implemented by every tool backend
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Invoke the tool with task parameters.
    ///
    /// `timeout` bounds the whole invocation; implementations should abandon
    /// the call on expiry. An `Err` here means the adapter itself could not
    /// complete the contract and is treated like a failed response.
    async fn execute(&self, params: &Map<String, Value>, timeout: Duration)
        -> Result<ToolResponse>;

    /// Cheap availability probe
    async fn health_check(&self) -> Result<()>;
}
