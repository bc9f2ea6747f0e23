//! Shared stub adapters for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use convoke::domain::ToolMetadata;
use convoke::{ToolAdapter, ToolCatalog, ToolResponse};

/// Adapter that always returns a fixed payload
pub struct StaticAdapter {
    name: String,
    payload: Value,
}

impl StaticAdapter {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }
}

#[async_trait]
impl ToolAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _params: &Map<String, Value>,
        _timeout: Duration,
    ) -> anyhow::Result<ToolResponse> {
        Ok(ToolResponse::ok(self.payload.clone()))
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Adapter that always reports failure
pub struct FailingAdapter {
    name: String,
}

impl FailingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ToolAdapter for FailingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _params: &Map<String, Value>,
        _timeout: Duration,
    ) -> anyhow::Result<ToolResponse> {
        Ok(ToolResponse::failed("simulated failure"))
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        anyhow::bail!("simulated failure")
    }
}

/// Adapter that sleeps longer than any reasonable timeout
pub struct HangingAdapter {
    name: String,
}

impl HangingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ToolAdapter for HangingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _params: &Map<String, Value>,
        _timeout: Duration,
    ) -> anyhow::Result<ToolResponse> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ToolResponse::ok(Value::Null))
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Register metadata with a static payload adapter
pub fn register_static(catalog: &ToolCatalog, metadata: ToolMetadata, payload: Value) {
    let adapter = Arc::new(StaticAdapter::new(&metadata.name, payload));
    catalog.register(metadata, adapter).unwrap();
}

/// Register metadata with an always-failing adapter
pub fn register_failing(catalog: &ToolCatalog, metadata: ToolMetadata) {
    let adapter = Arc::new(FailingAdapter::new(&metadata.name));
    catalog.register(metadata, adapter).unwrap();
}
