//! Core orchestration logic.
//!
//! This module contains:
//! - Catalog: static tool registry
//! - Tracker: rolling execution history and reliability metrics
//! - Ranking/Selector: candidate proposal and ranking
//! - Scheduler: dependency waves, concurrency, timeout, failover
//! - Aggregator: merge, deduplicate, reconcile
//! - Orchestrator: the single select-execute-aggregate call

pub mod aggregator;
pub mod catalog;
pub mod orchestrator;
pub mod ranking;
pub mod scheduler;
pub mod selector;
pub mod tracker;

// Re-export commonly used types
pub use aggregator::ResultAggregator;
pub use catalog::ToolCatalog;
pub use orchestrator::Orchestrator;
pub use ranking::{OracleRanking, RankingStrategy, RuleBasedRanking};
pub use scheduler::{ExecutionScheduler, ExecutionStrategy};
pub use selector::ToolSelector;
pub use tracker::{PerformanceMetrics, PerformanceRecord, PerformanceTracker, SortBy};
