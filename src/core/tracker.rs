//! Performance tracker: rolling execution history and derived metrics.
//!
//! Process-wide and written to by many in-flight tool executions; all state
//! sits behind one coarse `Mutex`, which is fine because writes are cheap
//! relative to I/O-bound tool latency.
//!
//! History is append-only between prunes. Every Kth insert drops records
//! older than the retention window and recomputes every aggregate from the
//! surviving window, so aggregates are windowed approximations rather than
//! exact real-time statistics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prune cadence: every Kth insert triggers a retention sweep
const PRUNE_EVERY: u64 = 50;

/// One recorded tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub tool_name: String,
    pub success: bool,
    pub duration_secs: f64,
    pub cost_usd: f64,
    pub quality: f64,
    pub timestamp: DateTime<Utc>,
}

/// Running per-tool aggregate, recomputed from the retention window on prune
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolAggregate {
    pub total: u64,
    pub successes: u64,
    pub duration_sum_secs: f64,
    pub cost_sum_usd: f64,
    pub quality_sum: f64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

impl ToolAggregate {
    fn apply(&mut self, record: &PerformanceRecord) {
        self.total += 1;
        if record.success {
            self.successes += 1;
            self.last_success = Some(record.timestamp);
        } else {
            self.last_failure = Some(record.timestamp);
        }
        self.duration_sum_secs += record.duration_secs;
        self.cost_sum_usd += record.cost_usd;
        self.quality_sum += record.quality;
    }
}

/// Derived metrics for one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub tool_name: String,
    pub executions: u64,
    pub success_rate: f64,
    pub avg_duration_secs: f64,
    pub avg_cost_usd: f64,
    pub avg_quality: f64,
    /// Success rate plus a small recency bonus, capped at 1.0
    pub reliability: f64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

/// Key to rank tools by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Reliability,
    SuccessRate,
    Speed,
    Cost,
    Quality,
}

struct TrackerState {
    history: Vec<PerformanceRecord>,
    aggregates: HashMap<String, ToolAggregate>,
    inserts: u64,
}

/// Rolling execution history with per-tool aggregates
pub struct PerformanceTracker {
    state: Mutex<TrackerState>,
    retention: ChronoDuration,
}

impl PerformanceTracker {
    /// Create a tracker with the given retention window in days
    pub fn new(retention_days: i64) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                history: Vec::new(),
                aggregates: HashMap::new(),
                inserts: 0,
            }),
            retention: ChronoDuration::days(retention_days),
        }
    }

    /// Record one tool execution and update its aggregate in the same step
    pub fn record(
        &self,
        tool_name: &str,
        success: bool,
        duration: Duration,
        cost_usd: f64,
        quality: f64,
    ) {
        let record = PerformanceRecord {
            tool_name: tool_name.to_string(),
            success,
            duration_secs: duration.as_secs_f64(),
            cost_usd,
            quality,
            timestamp: Utc::now(),
        };

        let mut state = self.state.lock().expect("tracker lock poisoned");
        state
            .aggregates
            .entry(record.tool_name.clone())
            .or_default()
            .apply(&record);
        state.history.push(record);
        state.inserts += 1;

        if state.inserts % PRUNE_EVERY == 0 {
            Self::prune(&mut state, self.retention);
        }
    }

    /// Drop records outside the retention window and rebuild aggregates
    fn prune(state: &mut TrackerState, retention: ChronoDuration) {
        let cutoff = Utc::now() - retention;
        let before = state.history.len();
        state.history.retain(|r| r.timestamp >= cutoff);

        let mut aggregates: HashMap<String, ToolAggregate> = HashMap::new();
        for record in &state.history {
            aggregates
                .entry(record.tool_name.clone())
                .or_default()
                .apply(record);
        }
        state.aggregates = aggregates;

        debug!(
            dropped = before - state.history.len(),
            remaining = state.history.len(),
            "Pruned performance history"
        );
    }

    /// Derived metrics for one tool, if it has any recorded history
    pub fn metrics(&self, tool_name: &str) -> Option<PerformanceMetrics> {
        let state = self.state.lock().expect("tracker lock poisoned");
        let agg = state.aggregates.get(tool_name)?;
        Some(Self::derive(tool_name, agg))
    }

    fn derive(tool_name: &str, agg: &ToolAggregate) -> PerformanceMetrics {
        let total = agg.total.max(1) as f64;
        let success_rate = agg.successes as f64 / total;

        // Recency bonus: a success within 7 days is worth more than one
        // within 30.
        let now = Utc::now();
        let bonus = match agg.last_success {
            Some(ts) if now - ts <= ChronoDuration::days(7) => 0.1,
            Some(ts) if now - ts <= ChronoDuration::days(30) => 0.05,
            _ => 0.0,
        };

        PerformanceMetrics {
            tool_name: tool_name.to_string(),
            executions: agg.total,
            success_rate,
            avg_duration_secs: agg.duration_sum_secs / total,
            avg_cost_usd: agg.cost_sum_usd / total,
            avg_quality: agg.quality_sum / total,
            reliability: (success_rate + bonus).min(1.0),
            last_success: agg.last_success,
            last_failure: agg.last_failure,
        }
    }

    /// All tracked tools ranked best-first by the given key
    pub fn ranked(&self, sort: SortBy) -> Vec<PerformanceMetrics> {
        let state = self.state.lock().expect("tracker lock poisoned");
        let mut metrics: Vec<PerformanceMetrics> = state
            .aggregates
            .iter()
            .map(|(name, agg)| Self::derive(name, agg))
            .collect();
        drop(state);

        metrics.sort_by(|a, b| {
            let ord = match sort {
                SortBy::Reliability => b.reliability.partial_cmp(&a.reliability),
                SortBy::SuccessRate => b.success_rate.partial_cmp(&a.success_rate),
                // Lower is better for speed and cost.
                SortBy::Speed => a.avg_duration_secs.partial_cmp(&b.avg_duration_secs),
                SortBy::Cost => a.avg_cost_usd.partial_cmp(&b.avg_cost_usd),
                SortBy::Quality => b.avg_quality.partial_cmp(&a.avg_quality),
            };
            ord.unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tool_name.cmp(&b.tool_name))
        });
        metrics
    }

    /// Ranked metrics restricted to the given tool names
    pub fn ranked_among(&self, names: &[String], sort: SortBy) -> Vec<PerformanceMetrics> {
        self.ranked(sort)
            .into_iter()
            .filter(|m| names.contains(&m.tool_name))
            .collect()
    }

    /// Map of tool name to rank (1 = best) by the given key
    pub fn rank_map(&self, sort: SortBy) -> HashMap<String, usize> {
        self.ranked(sort)
            .into_iter()
            .enumerate()
            .map(|(i, m)| (m.tool_name, i + 1))
            .collect()
    }

    /// Number of records currently held
    pub fn history_len(&self) -> usize {
        self.state.lock().expect("tracker lock poisoned").history.len()
    }
}
