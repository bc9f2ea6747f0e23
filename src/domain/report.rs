//! Orchestration request and report types.
//!
//! A report is the caller-facing record of one run: what was asked, what was
//! recommended, what actually ran, and the merged outcome.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::recommendation::{SelectionStrategy, ToolRecommendation};
use super::result::{AggregatedResult, ExecutionResult};

/// Broad class of task being orchestrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Reconnaissance,
    Scanning,
    Osint,
    Analysis,
    Reporting,
    General,
}

impl Default for TaskType {
    fn default() -> Self {
        Self::General
    }
}

/// Parameters for one orchestration call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    /// Broad class of task
    #[serde(default)]
    pub task_type: TaskType,

    /// Free-text description, also mined for category keywords
    pub description: String,

    /// Parameters forwarded to every tool invocation
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Selection strategy
    #[serde(default)]
    pub strategy: SelectionStrategy,

    /// Maximum number of tools to select
    #[serde(default = "default_max_tools")]
    pub max_tools: usize,

    /// Per-tool timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Do not start later waves once a tool has ultimately failed
    #[serde(default)]
    pub stop_on_error: bool,

    /// Preferred tool names, stable-sorted to the front of the candidates
    #[serde(default)]
    pub preferred_tools: Vec<String>,

    /// Whether to ask the oracle for a narrative synthesis
    #[serde(default)]
    pub synthesize_narrative: bool,
}

fn default_max_tools() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

impl OrchestrationRequest {
    /// Minimal request for a task description
    pub fn new(task_type: TaskType, description: impl Into<String>) -> Self {
        Self {
            task_type,
            description: description.into(),
            params: Map::new(),
            strategy: SelectionStrategy::default(),
            max_tools: default_max_tools(),
            timeout_secs: default_timeout_secs(),
            stop_on_error: false,
            preferred_tools: Vec::new(),
            synthesize_narrative: false,
        }
    }

    /// Per-tool timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Caller-facing record of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationReport {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// The request that produced this report
    pub request: OrchestrationRequest,

    /// Ranked recommendations the selector produced
    pub recommendations: Vec<ToolRecommendation>,

    /// Per-attempt outcomes, in completion order within waves
    pub results: Vec<ExecutionResult>,

    /// Merged, deduplicated, conflict-annotated output
    pub aggregate: AggregatedResult,

    /// True iff at least one tool produced a successful result
    pub success: bool,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl OrchestrationReport {
    /// Wall-clock duration of the run
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Names of tools that actually executed (post-failover)
    pub fn tools_executed(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.tool_name.as_str()).collect()
    }
}
