//! Per-task tool recommendations.
//!
//! Recommendations are ephemeral: produced by the selector for one
//! orchestration run and discarded with it.

use serde::{Deserialize, Serialize};

use super::metadata::ExecutionMode;

/// Strategy steering tool selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Prefer coverage: rank purely by task fit
    Comprehensive,
    /// Prefer fast tools
    Efficient,
    /// Weight task fit by observed success rate
    Reliable,
    /// Move free-tier tools to the front
    CostOptimized,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::Comprehensive
    }
}

/// A ranked candidate tool for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecommendation {
    /// Tool name (catalog key)
    pub tool_name: String,

    /// Task-fit confidence in [0, 1]
    pub confidence: f64,

    /// Human-readable reason for the ranking
    pub reason: String,

    /// Scheduling mode copied from metadata
    pub execution_mode: ExecutionMode,

    /// Estimated execution time in seconds
    pub estimated_secs: f64,

    /// Estimated invocation cost in USD
    pub estimated_cost_usd: f64,
}

impl ToolRecommendation {
    /// Clamp confidence into [0, 1]
    pub fn clamp_confidence(&mut self) {
        self.confidence = self.confidence.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamping() {
        let mut rec = ToolRecommendation {
            tool_name: "port_scan".to_string(),
            confidence: 1.3,
            reason: "test".to_string(),
            execution_mode: ExecutionMode::Parallel,
            estimated_secs: 5.0,
            estimated_cost_usd: 0.0,
        };
        rec.clamp_confidence();
        assert_eq!(rec.confidence, 1.0);
    }

    #[test]
    fn test_strategy_serde() {
        let s: SelectionStrategy = serde_yaml::from_str("cost_optimized").unwrap();
        assert_eq!(s, SelectionStrategy::CostOptimized);
    }
}
