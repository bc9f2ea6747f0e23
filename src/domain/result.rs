//! Execution and aggregation result types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key set when a failover substitute produced the result
pub const FAILOVER_FROM_KEY: &str = "failover_from";

/// Outcome of one attempted tool, including failover substitutions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Name of the tool that actually produced this result. Differs from the
    /// originally selected tool when failover occurred.
    pub tool_name: String,

    /// Whether the tool reported success
    pub success: bool,

    /// Tool output payload (shape is tool-specific)
    pub payload: Value,

    /// Wall-clock execution time
    #[serde(with = "duration_secs")]
    pub duration: Duration,

    /// Error message when the tool failed
    pub error: Option<String>,

    /// Result metadata; carries `failover_from` when substituted
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExecutionResult {
    /// Build a failed result with an empty payload
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            payload: Value::Null,
            duration,
            error: Some(error.into()),
            metadata: Map::new(),
        }
    }

    /// The originally selected tool this result was substituted for, if any
    pub fn failover_from(&self) -> Option<&str> {
        self.metadata.get(FAILOVER_FROM_KEY).and_then(Value::as_str)
    }

    /// Whether the payload carries any content
    pub fn has_payload(&self) -> bool {
        match &self.payload {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            _ => true,
        }
    }

    /// Quality score fed back to the performance tracker.
    ///
    /// Base 0.5; +0.3 for a non-empty payload; +0.1 under 5s, -0.1 over 30s;
    /// +0.1 when tool-provided metadata is present; clamped to [0, 1].
    /// The engine-injected `failover_from` key does not count as
    /// tool-provided metadata.
    pub fn quality_score(&self) -> f64 {
        let mut score: f64 = 0.5;
        if self.has_payload() {
            score += 0.3;
        }
        if self.duration < Duration::from_secs(5) {
            score += 0.1;
        } else if self.duration > Duration::from_secs(30) {
            score -= 0.1;
        }
        if self.metadata.keys().any(|k| k != FAILOVER_FROM_KEY) {
            score += 0.1;
        }
        score.clamp(0.0, 1.0)
    }
}

/// One value contributed to a merged field, tagged with its source tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedValue {
    pub value: Value,
    pub source: String,
}

/// A disagreement between two tools on the same scalar field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub field: String,
    pub tool_a: String,
    pub value_a: Value,
    pub tool_b: String,
    pub value_b: Value,
}

/// Counts describing one orchestration run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Unified output of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// One chosen value per merged field, from the highest-confidence source
    pub primary_findings: Map<String, Value>,

    /// Full payload per successful tool
    pub supporting_evidence: Map<String, Value>,

    /// Confidence per contributing tool
    pub confidence: Map<String, Value>,

    /// Detected cross-tool disagreements
    pub conflicts: Vec<Conflict>,

    /// Optional synthesized narrative
    pub narrative: Option<String>,

    /// Tools that contributed (or, in the all-failed case, were attempted)
    pub tool_attribution: Vec<String>,

    /// Attempt counts for the run
    pub counts: RunCounts,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
