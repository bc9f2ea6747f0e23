//! convoke - dependency-aware tool orchestration engine
//!
//! Coordinates execution of many independently-implemented external tools
//! (adapters over HTTP APIs or local commands) to answer a task, then merges
//! their outputs into one coherent result.
//!
//! # Architecture
//!
//! One orchestration call flows through four components:
//! - The **selector** proposes ranked candidate tools from catalog metadata,
//!   a pluggable ranking strategy, and tracker history
//! - The **scheduler** groups them into dependency-respecting waves and runs
//!   each wave concurrently with per-tool timeout and failover
//! - The **aggregator** merges, deduplicates, and reconciles the outputs
//! - The **tracker** records every attempt, feeding reliability metrics back
//!   into the next selection
//!
//! Partial failures never surface as errors: a failed tool falls through its
//! failover chain, a failed chain becomes a failed result, and a run with
//! zero successes becomes a degraded aggregate with an explicit error marker.
//!
//! # Modules
//!
//! - `adapters`: the uniform tool invocation contract (command, HTTP)
//! - `core`: orchestration logic (Catalog, Tracker, Selector, Scheduler,
//!   Aggregator, Orchestrator)
//! - `domain`: data structures (metadata, recommendations, results, reports)
//! - `oracle`: the fallible reasoning-oracle interface
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run an orchestration against a tool manifest
//! convoke --manifest tools.yaml run "scan ports on example.com" \
//!     --task-type scanning --param target=example.com
//!
//! # List registered tools
//! convoke --manifest tools.yaml tools
//!
//! # Health-check every tool backend
//! convoke --manifest tools.yaml check
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod oracle;

// Re-export main types at crate root for convenience
pub use core::{
    ExecutionScheduler, ExecutionStrategy, Orchestrator, PerformanceTracker, ResultAggregator,
    SortBy, ToolCatalog, ToolSelector,
};
pub use domain::{
    AggregatedResult, Conflict, ExecutionResult, OrchestrationReport, OrchestrationRequest,
    SelectionStrategy, TaskType, ToolCategory, ToolMetadata, ToolRecommendation,
};
pub use error::{ConvokeError, RankingError};

// Adapter contract
pub use adapters::{CommandAdapter, HttpAdapter, ToolAdapter, ToolResponse};

// Reasoning oracle
pub use oracle::{CommandOracle, NullOracle, ReasoningOracle};
