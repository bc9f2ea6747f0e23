//! Engine configuration and tool manifest loading.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variable (CONVOKE_CONFIG pointing at a YAML file)
//! 2. ./convoke.yaml in the working directory
//! 3. ~/.convoke/config.yaml
//! 4. Built-in defaults
//!
//! The tool manifest is a separate YAML file declaring the registry: one
//! entry per tool with its metadata and backend (command or HTTP endpoint).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::adapters::{CommandAdapter, HttpAdapter, ToolAdapter};
use crate::core::ToolCatalog;
use crate::domain::ToolMetadata;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CONVOKE_CONFIG";

/// Engine configuration file schema
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Per-tool timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Tracker retention window in days
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Default maximum number of tools per run
    #[serde(default = "default_max_tools")]
    pub max_tools: usize,

    /// Path to the tool manifest
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Generative CLI used as the reasoning oracle, if any
    #[serde(default)]
    pub oracle_binary: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retention_days() -> i64 {
    30
}

fn default_max_tools() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            retention_days: default_retention_days(),
            max_tools: default_max_tools(),
            manifest: None,
            oracle_binary: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration using the documented precedence
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let cwd_config = PathBuf::from("convoke.yaml");
        if cwd_config.exists() {
            return Self::from_file(&cwd_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".convoke").join("config.yaml");
            if home_config.exists() {
                return Self::from_file(&home_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// One tool declaration in the manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestTool {
    #[serde(flatten)]
    pub metadata: ToolMetadata,
    pub backend: ToolBackend,
}

/// Backend an adapter is built from.
///
/// Internally tagged on `kind` so it deserializes through the buffered
/// content path the flattened metadata forces on serde_yaml.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolBackend {
    /// Local command invoked with params on stdin
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// HTTP endpoint the params are POSTed to
    Http {
        endpoint: String,
        /// Environment variable holding the bearer token, if auth is needed
        #[serde(default)]
        auth_token_env: Option<String>,
    },
}

/// Declarative tool registry file
#[derive(Debug, Clone, Deserialize)]
pub struct ToolManifest {
    pub version: u32,
    pub tools: Vec<ManifestTool>,
}

impl ToolManifest {
    /// Load a manifest from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool manifest: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a manifest from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(content).context("Failed to parse tool manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate every declared tool
    pub fn validate(&self) -> Result<()> {
        if self.tools.is_empty() {
            anyhow::bail!("Tool manifest declares no tools");
        }
        for tool in &self.tools {
            tool.metadata.validate()?;
        }
        Ok(())
    }

    /// Build a catalog from the manifest, constructing one adapter per tool
    pub fn build_catalog(&self) -> Result<ToolCatalog> {
        let catalog = ToolCatalog::new();

        for tool in &self.tools {
            let name = tool.metadata.name.clone();
            let adapter: Arc<dyn ToolAdapter> = match &tool.backend {
                ToolBackend::Command { program, args } => Arc::new(CommandAdapter::new(
                    name.clone(),
                    program.clone(),
                    args.clone(),
                )),
                ToolBackend::Http {
                    endpoint,
                    auth_token_env,
                } => {
                    let mut adapter = HttpAdapter::new(name.clone(), endpoint.clone());
                    if let Some(var) = auth_token_env {
                        if let Ok(token) = std::env::var(var) {
                            adapter = adapter.with_auth_token(token);
                        }
                    }
                    Arc::new(adapter)
                }
            };
            catalog.register(tool.metadata.clone(), adapter)?;
        }

        info!(tools = catalog.len(), "Built tool catalog from manifest");
        Ok(catalog)
    }
}
