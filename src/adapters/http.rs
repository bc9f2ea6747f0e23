//! HTTP JSON tool adapter.
//!
//! Posts the task parameters as a JSON body to a tool endpoint and expects a
//! contract-shaped `ToolResponse` back. Non-2xx statuses and non-contract
//! bodies are adapter errors, which the scheduler treats as tool failures.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{ToolAdapter, ToolResponse};

/// Tool adapter backed by an HTTP endpoint
pub struct HttpAdapter {
    /// Adapter name (usually the tool name)
    name: String,

    /// Endpoint the params are POSTed to
    endpoint: String,

    /// Optional bearer token for tools that require auth
    auth_token: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAdapter {
    /// Create a new HTTP adapter
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            auth_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attach a bearer token sent with every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[async_trait]
impl ToolAdapter for HttpAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        params: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<ToolResponse> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(params);

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach tool endpoint '{}'", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Tool '{}' endpoint returned {}: {}",
                self.name,
                status,
                body.chars().take(200).collect::<String>()
            );
        }

        let tool_response: ToolResponse = response
            .json()
            .await
            .with_context(|| format!("Tool '{}' returned a non-contract body", self.name))?;

        Ok(tool_response)
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .with_context(|| format!("Health check for '{}' failed to connect", self.name))?;

        // Any response at all means the endpoint is reachable; some tool
        // services reject GET with 405.
        let status = response.status();
        if status.is_server_error() {
            anyhow::bail!("Tool '{}' endpoint unhealthy: {}", self.name, status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_name() {
        let adapter = HttpAdapter::new("shodan_lookup", "http://localhost:9000/run");
        assert_eq!(adapter.name(), "shodan_lookup");
        assert!(adapter.auth_token.is_none());
    }

    #[test]
    fn test_auth_token_builder() {
        let adapter =
            HttpAdapter::new("censys_lookup", "http://localhost:9001/run").with_auth_token("tok");
        assert_eq!(adapter.auth_token.as_deref(), Some("tok"));
    }
}
