//! Tool catalog: static registry of adapters and their metadata.
//!
//! Process-wide, created once at startup and shared by `Arc` across runs.
//! No execution logic lives here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use tracing::warn;

use crate::adapters::ToolAdapter;
use crate::domain::{ToolCategory, ToolMetadata};

/// Registry entry pairing an adapter handle with its descriptor
struct CatalogEntry {
    adapter: Arc<dyn ToolAdapter>,
    metadata: ToolMetadata,
}

/// Registry mapping tool name to adapter handle and metadata
#[derive(Default)]
pub struct ToolCatalog {
    entries: RwLock<HashMap<String, CatalogEntry>>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool.
    ///
    /// Re-registering a name overwrites the previous entry and logs a
    /// warning. Only metadata that fails validation is an error.
    pub fn register(&self, metadata: ToolMetadata, adapter: Arc<dyn ToolAdapter>) -> Result<()> {
        metadata.validate()?;

        let name = metadata.name.clone();
        let mut entries = self.entries.write().expect("catalog lock poisoned");

        if entries.contains_key(&name) {
            warn!(tool = %name, "Re-registering tool, previous entry overwritten");
        }

        entries.insert(name, CatalogEntry { adapter, metadata });
        Ok(())
    }

    /// Get the adapter handle for a tool
    pub fn adapter(&self, name: &str) -> Option<Arc<dyn ToolAdapter>> {
        self.entries
            .read()
            .expect("catalog lock poisoned")
            .get(name)
            .map(|e| Arc::clone(&e.adapter))
    }

    /// Get the static descriptor for a tool
    pub fn metadata(&self, name: &str) -> Option<ToolMetadata> {
        self.entries
            .read()
            .expect("catalog lock poisoned")
            .get(name)
            .map(|e| e.metadata.clone())
    }

    /// List tool names in a category, sorted for determinism
    pub fn by_category(&self, category: ToolCategory) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .expect("catalog lock poisoned")
            .values()
            .filter(|e| e.metadata.category == category)
            .map(|e| e.metadata.name.clone())
            .collect();
        names.sort();
        names
    }

    /// All registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .expect("catalog lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.read().expect("catalog lock poisoned").len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
