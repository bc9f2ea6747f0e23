//! Domain types for the convoke engine.
//!
//! This module contains the core data structures:
//! - Metadata: static per-tool descriptors
//! - Recommendation: ephemeral per-task rankings
//! - Result: execution outcomes and the aggregated run output
//! - Report: the caller-facing request/report pair

pub mod metadata;
pub mod recommendation;
pub mod report;
pub mod result;

// Re-export commonly used types
pub use metadata::{CostTier, ExecutionMode, ToolCategory, ToolMetadata};
pub use recommendation::{SelectionStrategy, ToolRecommendation};
pub use report::{OrchestrationReport, OrchestrationRequest, TaskType};
pub use result::{
    AggregatedResult, Conflict, ExecutionResult, RunCounts, SourcedValue, FAILOVER_FROM_KEY,
};
