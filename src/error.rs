//! Engine error taxonomy.
//!
//! Individual tool failures are recovered locally via failover chains and
//! never surface as errors from an orchestration call. These variants cover
//! the cases that do surface, plus the internal markers the scheduler and
//! aggregator use to classify attempts.

use thiserror::Error;

/// Errors produced by the orchestration engine
#[derive(Debug, Clone, Error)]
pub enum ConvokeError {
    #[error("Tool '{name}' is not registered in the catalog")]
    ToolNotFound { name: String },

    #[error("Tool '{name}' timed out after {timeout_secs}s")]
    ToolTimeout { name: String, timeout_secs: u64 },

    #[error("Tool '{name}' execution failed: {message}")]
    ToolExecutionError { name: String, message: String },

    #[error("Selection failed: {reason}")]
    SelectionFailure { reason: String },

    #[error("Aggregation degraded: {reason}")]
    AggregationDegraded { reason: String },

    #[error("Invalid tool metadata for '{name}': {reason}")]
    InvalidMetadata { name: String, reason: String },
}

/// Reasons an oracle ranking reply is rejected in favor of the
/// deterministic fallback
#[derive(Debug, Clone, Error)]
pub enum RankingError {
    #[error("Oracle is unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Oracle reply is not valid JSON: {0}")]
    MalformedReply(String),

    #[error("Oracle reply does not match the ranking schema: {0}")]
    SchemaMismatch(String),

    #[error("Oracle ranked unknown tool '{0}'")]
    UnknownTool(String),
}
