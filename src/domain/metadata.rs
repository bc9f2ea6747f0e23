//! Static tool descriptors.
//!
//! One `ToolMetadata` per registered tool. Metadata is declarative and loaded
//! from the tool manifest; no execution logic lives here.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Category a tool belongs to, used for candidate gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Host and service discovery
    Recon,
    /// Active scanning and enumeration
    Scan,
    /// Open-source intelligence lookups
    Osint,
    /// Data analysis and correlation
    Analysis,
    /// Report and summary generation
    Report,
    /// Network diagnostics
    Network,
    /// Web content retrieval and inspection
    Web,
    /// Catch-all for tools with no specific category
    Generic,
}

/// How a tool prefers to be scheduled relative to others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Safe to run alongside any other tool
    Parallel,
    /// Must run one-at-a-time
    Sequential,
    /// No interaction with other tools either way
    Independent,
    /// Consumes output of its declared dependencies
    Dependent,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Parallel
    }
}

/// Pricing tier for a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Free,
    Metered,
    Premium,
}

impl Default for CostTier {
    fn default() -> Self {
        Self::Free
    }
}

impl CostTier {
    /// Rough per-invocation cost estimate in USD, used for ranking notes
    pub fn estimate_usd(&self) -> f64 {
        match self {
            Self::Free => 0.0,
            Self::Metered => 0.01,
            Self::Premium => 0.10,
        }
    }
}

/// Static descriptor for a registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Unique tool name (catalog key)
    pub name: String,

    /// Category for candidate gathering
    pub category: ToolCategory,

    /// Preferred scheduling mode
    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Tools that must complete before this one starts
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Ordered substitutes to try when this tool fails or times out
    #[serde(default)]
    pub failover_chain: Vec<String>,

    /// Pricing tier
    #[serde(default)]
    pub cost_tier: CostTier,

    /// Whether the tool needs credentials to run
    #[serde(default)]
    pub requires_auth: bool,

    /// Typical execution time in seconds
    #[serde(default = "default_avg_execution_secs")]
    pub avg_execution_secs: f64,

    /// Seed success rate, used until real history accumulates
    #[serde(default = "default_seed_success_rate")]
    pub seed_success_rate: f64,
}

fn default_avg_execution_secs() -> f64 {
    10.0
}

fn default_seed_success_rate() -> f64 {
    0.9
}

impl ToolMetadata {
    /// Create metadata with defaults for everything but name and category
    pub fn new(name: impl Into<String>, category: ToolCategory) -> Self {
        Self {
            name: name.into(),
            category,
            execution_mode: ExecutionMode::default(),
            depends_on: Vec::new(),
            failover_chain: Vec::new(),
            cost_tier: CostTier::default(),
            requires_auth: false,
            avg_execution_secs: default_avg_execution_secs(),
            seed_success_rate: default_seed_success_rate(),
        }
    }

    /// Validate the descriptor.
    ///
    /// A failover chain containing the tool's own name would loop forever,
    /// so it is rejected. Dependency cycles are deliberately NOT rejected
    /// here: the scheduler degrades them to a single flat wave.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Tool name cannot be empty");
        }

        if self.failover_chain.iter().any(|f| f == &self.name) {
            anyhow::bail!(
                "Tool '{}' lists itself in its own failover chain",
                self.name
            );
        }

        if !(0.0..=1.0).contains(&self.seed_success_rate) {
            anyhow::bail!(
                "Tool '{}' has seed success rate {} outside [0, 1]",
                self.name,
                self.seed_success_rate
            );
        }

        Ok(())
    }

    /// Whether this tool declares any dependencies
    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }
}
