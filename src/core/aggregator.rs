//! Result aggregator: merge, deduplicate, reconcile, synthesize.
//!
//! Consumes the execution results of one run and produces the unified
//! `AggregatedResult`. Aggregation never fails: with zero successful tools
//! it short-circuits to a degraded result carrying an explicit error marker.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::domain::{AggregatedResult, Conflict, ExecutionResult, RunCounts, SourcedValue};
use crate::oracle::ReasoningOracle;

/// Bucket name for list elements and bare scalar payloads
const GENERIC_FIELD: &str = "results";

/// Confidence penalty applied when a result came from a failover substitute
const FAILOVER_PENALTY: f64 = 0.1;

/// Merges per-tool outputs into one coherent result
pub struct ResultAggregator {
    oracle: Option<Arc<dyn ReasoningOracle>>,
}

impl ResultAggregator {
    /// Aggregator without narrative synthesis
    pub fn new() -> Self {
        Self { oracle: None }
    }

    /// Aggregator that synthesizes narratives via the reasoning oracle
    pub fn with_oracle(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            oracle: Some(oracle),
        }
    }

    /// Aggregate one run's execution results
    #[instrument(skip(self, results), fields(results = results.len()))]
    pub async fn aggregate(
        &self,
        results: &[ExecutionResult],
        synthesize: bool,
    ) -> AggregatedResult {
        let (successes, failures): (Vec<&ExecutionResult>, Vec<&ExecutionResult>) =
            results.iter().partition(|r| r.success);

        let counts = RunCounts {
            attempted: results.len(),
            successful: successes.len(),
            failed: failures.len(),
        };

        if successes.is_empty() {
            warn!("No successful tool results, returning degraded aggregate");
            let mut primary_findings = Map::new();
            primary_findings.insert(
                "error".to_string(),
                Value::String("All tools failed".to_string()),
            );
            return AggregatedResult {
                primary_findings,
                supporting_evidence: Map::new(),
                confidence: Map::new(),
                conflicts: Vec::new(),
                narrative: None,
                tool_attribution: failures.iter().map(|r| r.tool_name.clone()).collect(),
                counts,
            };
        }

        let merged = merge_fields(&successes);
        let merged = dedup_fields(merged);
        let conflicts = detect_conflicts(&successes);
        let confidence = tool_confidence(&successes);
        let primary_findings = pick_primary(&merged, &confidence);

        let narrative = if synthesize {
            Some(self.synthesize_narrative(&merged, &successes).await)
        } else {
            None
        };

        let mut supporting_evidence = Map::new();
        for result in &successes {
            supporting_evidence.insert(result.tool_name.clone(), result.payload.clone());
        }

        let confidence_map: Map<String, Value> = confidence
            .iter()
            .map(|(tool, c)| (tool.clone(), json!(c)))
            .collect();

        AggregatedResult {
            primary_findings,
            supporting_evidence,
            confidence: confidence_map,
            conflicts,
            narrative,
            tool_attribution: successes.iter().map(|r| r.tool_name.clone()).collect(),
            counts,
        }
    }

    /// Ask the oracle for a narrative; fall back to a templated sentence
    async fn synthesize_narrative(
        &self,
        merged: &[(String, Vec<SourcedValue>)],
        successes: &[&ExecutionResult],
    ) -> String {
        if let Some(oracle) = &self.oracle {
            let summary: Vec<String> = successes
                .iter()
                .map(|r| format!("{}: {}", r.tool_name, r.payload))
                .collect();
            let prompt = format!(
                "Write a short narrative summary of these tool findings.\n\nMerged data: {}\n\nPer-tool: {}",
                serde_json::to_string(&merged.iter().map(|(f, v)| (f, v)).collect::<Vec<_>>())
                    .unwrap_or_default(),
                summary.join("; ")
            );
            match oracle.complete(&prompt).await {
                Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                Ok(_) => debug!("Oracle returned an empty narrative"),
                Err(e) => warn!(error = %e, "Narrative synthesis failed, using template"),
            }
        }

        let fields: Vec<&str> = merged.iter().take(5).map(|(f, _)| f.as_str()).collect();
        format!(
            "Aggregated findings from {} tool(s) covering: {}.",
            successes.len(),
            if fields.is_empty() {
                "no fields".to_string()
            } else {
                fields.join(", ")
            }
        )
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Group field values across tools, preserving first-seen field order.
///
/// Object payloads contribute per-field; array payloads flatten element by
/// element into the generic bucket; scalar payloads land there whole.
pub fn merge_fields(successes: &[&ExecutionResult]) -> Vec<(String, Vec<SourcedValue>)> {
    let mut merged: Vec<(String, Vec<SourcedValue>)> = Vec::new();

    let mut push = |field: &str, value: Value, source: &str, merged: &mut Vec<(String, Vec<SourcedValue>)>| {
        let sourced = SourcedValue {
            value,
            source: source.to_string(),
        };
        if let Some((_, values)) = merged.iter_mut().find(|(f, _)| f == field) {
            values.push(sourced);
        } else {
            merged.push((field.to_string(), vec![sourced]));
        }
    };

    for result in successes {
        let source = result.tool_name.as_str();
        match &result.payload {
            Value::Object(map) => {
                for (field, value) in map {
                    push(field, value.clone(), source, &mut merged);
                }
            }
            Value::Array(items) => {
                for item in items {
                    push(GENERIC_FIELD, item.clone(), source, &mut merged);
                }
            }
            Value::Null => {}
            other => push(GENERIC_FIELD, other.clone(), source, &mut merged),
        }
    }

    merged
}

/// Content hash used for value-level deduplication
fn content_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Drop exact-value duplicates within each field, keeping first-seen order.
/// Idempotent: deduplicating twice yields the same result.
pub fn dedup_fields(
    merged: Vec<(String, Vec<SourcedValue>)>,
) -> Vec<(String, Vec<SourcedValue>)> {
    merged
        .into_iter()
        .map(|(field, values)| {
            let mut seen: Vec<String> = Vec::new();
            let deduped: Vec<SourcedValue> = values
                .into_iter()
                .filter(|sv| {
                    let hash = content_hash(&sv.value);
                    if seen.contains(&hash) {
                        false
                    } else {
                        seen.push(hash);
                        true
                    }
                })
                .collect();
            (field, deduped)
        })
        .collect()
}

/// Pairwise-compare successful object payloads for disagreeing scalar fields
pub fn detect_conflicts(successes: &[&ExecutionResult]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (i, a) in successes.iter().enumerate() {
        let Value::Object(map_a) = &a.payload else {
            continue;
        };
        for b in successes.iter().skip(i + 1) {
            let Value::Object(map_b) = &b.payload else {
                continue;
            };
            for (field, value_a) in map_a {
                let Some(value_b) = map_b.get(field) else {
                    continue;
                };
                let scalar =
                    !matches!(value_a, Value::Object(_) | Value::Array(_))
                        && !matches!(value_b, Value::Object(_) | Value::Array(_));
                if scalar && value_a != value_b {
                    conflicts.push(Conflict {
                        field: field.clone(),
                        tool_a: a.tool_name.clone(),
                        value_a: value_a.clone(),
                        tool_b: b.tool_name.clone(),
                        value_b: value_b.clone(),
                    });
                }
            }
        }
    }

    conflicts
}

/// Per-tool confidence: quality-score bonuses minus the failover penalty
pub fn tool_confidence(successes: &[&ExecutionResult]) -> Vec<(String, f64)> {
    successes
        .iter()
        .map(|r| {
            let mut c = r.quality_score();
            if r.failover_from().is_some() {
                c -= FAILOVER_PENALTY;
            }
            (r.tool_name.clone(), c.clamp(0.0, 1.0))
        })
        .collect()
}

/// For each merged field, keep the value from the highest-confidence source.
/// Ties keep first-seen order.
fn pick_primary(
    merged: &[(String, Vec<SourcedValue>)],
    confidence: &[(String, f64)],
) -> Map<String, Value> {
    let confidence_of = |tool: &str| -> f64 {
        confidence
            .iter()
            .find(|(t, _)| t == tool)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    };

    let mut findings = Map::new();
    for (field, values) in merged {
        let mut best: Option<(&SourcedValue, f64)> = None;
        for sv in values {
            let c = confidence_of(&sv.source);
            // Strictly greater keeps the first-seen value on ties.
            if best.map(|(_, bc)| c > bc).unwrap_or(true) {
                best = Some((sv, c));
            }
        }
        if let Some((sv, _)) = best {
            findings.insert(field.clone(), sv.value.clone());
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::domain::FAILOVER_FROM_KEY;

    fn success(tool: &str, payload: Value) -> ExecutionResult {
        ExecutionResult {
            tool_name: tool.to_string(),
            success: true,
            payload,
            duration: Duration::from_secs(1),
            error: None,
            metadata: Map::new(),
        }
    }

    fn failure(tool: &str) -> ExecutionResult {
        ExecutionResult::failure(tool, "boom", Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_all_failed_short_circuit() {
        let results = vec![failure("a"), failure("b")];
        let agg = ResultAggregator::new().aggregate(&results, false).await;

        assert_eq!(
            agg.primary_findings.get("error"),
            Some(&Value::String("All tools failed".to_string()))
        );
        assert_eq!(agg.tool_attribution, vec!["a", "b"]);
        assert_eq!(agg.counts.failed, 2);
        assert_eq!(agg.counts.successful, 0);
    }

    #[tokio::test]
    async fn test_port_conflict_detected_once() {
        let results = vec![
            success("nmap_scan", json!({"port": 80})),
            success("masscan", json!({"port": 8080})),
        ];
        let agg = ResultAggregator::new().aggregate(&results, false).await;

        assert_eq!(agg.conflicts.len(), 1);
        let conflict = &agg.conflicts[0];
        assert_eq!(conflict.field, "port");
        assert_eq!(conflict.tool_a, "nmap_scan");
        assert_eq!(conflict.tool_b, "masscan");
        assert_eq!(conflict.value_a, json!(80));
        assert_eq!(conflict.value_b, json!(8080));
    }

    #[tokio::test]
    async fn test_agreeing_fields_do_not_conflict() {
        let results = vec![
            success("a", json!({"host": "example.com"})),
            success("b", json!({"host": "example.com"})),
        ];
        let agg = ResultAggregator::new().aggregate(&results, false).await;
        assert!(agg.conflicts.is_empty());
    }

    #[test]
    fn test_merge_shapes() {
        let r1 = success("obj_tool", json!({"host": "a.com"}));
        let r2 = success("list_tool", json!(["x", "y"]));
        let r3 = success("scalar_tool", json!(42));
        let successes = vec![&r1, &r2, &r3];

        let merged = merge_fields(&successes);
        let host = merged.iter().find(|(f, _)| f == "host").unwrap();
        assert_eq!(host.1.len(), 1);

        let bucket = merged.iter().find(|(f, _)| f == GENERIC_FIELD).unwrap();
        // Two list elements plus one scalar.
        assert_eq!(bucket.1.len(), 3);
        assert_eq!(bucket.1[0].source, "list_tool");
        assert_eq!(bucket.1[2].source, "scalar_tool");
    }

    #[test]
    fn test_dedup_idempotent() {
        let r1 = success("a", json!({"host": "x.com"}));
        let r2 = success("b", json!({"host": "x.com"}));
        let successes = vec![&r1, &r2];

        let once = dedup_fields(merge_fields(&successes));
        let twice = dedup_fields(once.clone());
        assert_eq!(once, twice);

        let host = once.iter().find(|(f, _)| f == "host").unwrap();
        assert_eq!(host.1.len(), 1);
        // First-seen source survives.
        assert_eq!(host.1[0].source, "a");
    }

    #[tokio::test]
    async fn test_primary_findings_prefer_higher_confidence() {
        // slow_tool takes >30s (quality 0.7), fast_tool <5s (quality 0.9).
        let mut slow = success("slow_tool", json!({"banner": "Apache"}));
        slow.duration = Duration::from_secs(40);
        let fast = success("fast_tool", json!({"banner": "nginx"}));

        let agg = ResultAggregator::new()
            .aggregate(&[slow, fast], false)
            .await;
        assert_eq!(
            agg.primary_findings.get("banner"),
            Some(&Value::String("nginx".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failover_penalty_applied() {
        let mut substituted = success("backup_tool", json!({"k": 1}));
        substituted
            .metadata
            .insert(FAILOVER_FROM_KEY.to_string(), json!("primary_tool"));
        let direct = success("direct_tool", json!({"k": 2}));

        let confidences = tool_confidence(&[&substituted, &direct]);
        let sub_c = confidences.iter().find(|(t, _)| t == "backup_tool").unwrap().1;
        let dir_c = confidences.iter().find(|(t, _)| t == "direct_tool").unwrap().1;
        assert!(sub_c < dir_c);
    }

    #[tokio::test]
    async fn test_template_narrative_without_oracle() {
        let results = vec![success("a", json!({"host": "x.com"}))];
        let agg = ResultAggregator::new().aggregate(&results, true).await;
        let narrative = agg.narrative.unwrap();
        assert!(narrative.contains("1 tool"));
        assert!(narrative.contains("host"));
    }
}
