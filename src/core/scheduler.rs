//! Execution scheduler: dependency waves, concurrency, timeout, failover.
//!
//! Selected tools are grouped into waves whose declared dependencies are all
//! satisfied by earlier waves. Waves run strictly in sequence; tools within a
//! wave run concurrently and independently, so one tool's failure never
//! cancels its siblings. A cycle or missing dependency degrades to a single
//! flat final wave rather than failing the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{
    ExecutionResult, OrchestrationRequest, ToolMetadata, FAILOVER_FROM_KEY,
};
use crate::error::ConvokeError;

use super::catalog::ToolCatalog;
use super::tracker::PerformanceTracker;

/// How waves are formed for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// One wave containing every tool
    Parallel,
    /// One tool per wave, in dependency order
    Sequential,
    /// Dependency-respecting waves with intra-wave concurrency
    Hybrid,
    /// Defer to auto-detection (currently resolves to Hybrid)
    Adaptive,
}

/// Runs selected tools with per-tool timeout and failover
pub struct ExecutionScheduler {
    catalog: Arc<ToolCatalog>,
    tracker: Arc<PerformanceTracker>,
}

impl ExecutionScheduler {
    pub fn new(catalog: Arc<ToolCatalog>, tracker: Arc<PerformanceTracker>) -> Self {
        Self { catalog, tracker }
    }

    /// Pick a strategy from the candidates' declared shapes.
    ///
    /// No dependencies and homogeneous modes run fully parallel; declared
    /// dependencies with homogeneous modes run sequentially; anything mixed
    /// gets the hybrid wave treatment.
    pub fn detect_strategy(candidates: &[ToolMetadata]) -> ExecutionStrategy {
        let has_deps = candidates.iter().any(|m| m.has_dependencies());
        let homogeneous = candidates
            .windows(2)
            .all(|w| w[0].execution_mode == w[1].execution_mode);

        match (has_deps, homogeneous) {
            (false, true) => ExecutionStrategy::Parallel,
            (true, true) => ExecutionStrategy::Sequential,
            _ => ExecutionStrategy::Hybrid,
        }
    }

    /// Group candidates into dependency-respecting waves.
    ///
    /// Deterministic for a fixed candidate order: each pass walks the
    /// remaining tools in order and takes every tool whose dependencies are
    /// already executed. Dependencies pointing outside the candidate set are
    /// never satisfied, so a stalled pass dumps all remaining tools into one
    /// final wave.
    pub fn plan_waves(candidates: &[ToolMetadata]) -> Vec<Vec<String>> {
        let mut waves: Vec<Vec<String>> = Vec::new();
        let mut executed: HashSet<String> = HashSet::new();
        let mut remaining: Vec<&ToolMetadata> = candidates.iter().collect();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&ToolMetadata>, Vec<&ToolMetadata>) = remaining
                .into_iter()
                .partition(|m| m.depends_on.iter().all(|d| executed.contains(d)));

            if ready.is_empty() {
                // Cycle or missing dependency: degrade to one flat wave.
                warn!(
                    tools = blocked.len(),
                    "Unsatisfiable dependencies, collapsing remainder into one wave"
                );
                waves.push(blocked.iter().map(|m| m.name.clone()).collect());
                break;
            }

            for meta in &ready {
                executed.insert(meta.name.clone());
            }
            waves.push(ready.iter().map(|m| m.name.clone()).collect());
            remaining = blocked;
        }

        waves
    }

    /// Produce the wave plan for a strategy
    pub fn plan(strategy: ExecutionStrategy, candidates: &[ToolMetadata]) -> Vec<Vec<String>> {
        match strategy {
            ExecutionStrategy::Parallel => {
                vec![candidates.iter().map(|m| m.name.clone()).collect()]
            }
            ExecutionStrategy::Sequential => Self::plan_waves(candidates)
                .into_iter()
                .flatten()
                .map(|name| vec![name])
                .collect(),
            ExecutionStrategy::Hybrid | ExecutionStrategy::Adaptive => {
                Self::plan_waves(candidates)
            }
        }
    }

    /// Execute the selected tools wave by wave.
    ///
    /// `selected` is the recommendation order; metadata gaps (selected names
    /// missing from the catalog) become failed results rather than errors.
    #[instrument(skip(self, selected, request), fields(tools = selected.len()))]
    pub async fn execute(
        &self,
        selected: &[String],
        strategy: ExecutionStrategy,
        request: &OrchestrationRequest,
    ) -> Vec<ExecutionResult> {
        let candidates: Vec<ToolMetadata> = selected
            .iter()
            .map(|name| {
                self.catalog
                    .metadata(name)
                    .unwrap_or_else(|| ToolMetadata::new(name.clone(), crate::domain::ToolCategory::Generic))
            })
            .collect();

        let waves = Self::plan(strategy, &candidates);
        info!(waves = waves.len(), ?strategy, "Planned execution waves");

        let timeout = request.timeout();
        let mut results: Vec<ExecutionResult> = Vec::new();

        for (wave_idx, wave) in waves.iter().enumerate() {
            debug!(wave = wave_idx, tools = ?wave, "Starting wave");

            let mut join_set: JoinSet<ExecutionResult> = JoinSet::new();
            for name in wave {
                let catalog = Arc::clone(&self.catalog);
                let tracker = Arc::clone(&self.tracker);
                let params = request.params.clone();
                let name = name.clone();

                join_set.spawn(async move {
                    execute_with_failover(catalog, tracker, name, params, timeout).await
                });
            }

            let mut wave_failed = false;
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => {
                        if !result.success {
                            wave_failed = true;
                        }
                        results.push(result);
                    }
                    Err(e) => {
                        // A panicked tool task counts as a failure but must
                        // not take the wave down with it.
                        error!(error = %e, "Tool task panicked");
                        wave_failed = true;
                    }
                }
            }

            if request.stop_on_error && wave_failed {
                warn!(wave = wave_idx, "Stopping after failed wave (stop_on_error)");
                break;
            }
        }

        results
    }
}

/// Execute one selected tool, walking its failover chain on failure.
///
/// Every concrete attempt (primary and substitutes) is recorded to the
/// tracker under the attempted tool's name.
async fn execute_with_failover(
    catalog: Arc<ToolCatalog>,
    tracker: Arc<PerformanceTracker>,
    selected: String,
    params: Map<String, Value>,
    timeout: Duration,
) -> ExecutionResult {
    let chain: Vec<String> = catalog
        .metadata(&selected)
        .map(|m| m.failover_chain)
        .unwrap_or_default();

    let mut attempt_names = vec![selected.clone()];
    attempt_names.extend(chain);

    let mut last_error = String::from("no attempts made");

    for attempt_name in &attempt_names {
        let mut result = execute_single(&catalog, attempt_name, &params, timeout).await;

        let cost = catalog
            .metadata(attempt_name)
            .map(|m| m.cost_tier.estimate_usd())
            .unwrap_or(0.0);
        tracker.record(
            attempt_name,
            result.success,
            result.duration,
            cost,
            result.quality_score(),
        );

        if result.success {
            if attempt_name != &selected {
                info!(tool = %attempt_name, from = %selected, "Failover substitute succeeded");
                result
                    .metadata
                    .insert(FAILOVER_FROM_KEY.to_string(), Value::String(selected));
            }
            return result;
        }

        last_error = result.error.clone().unwrap_or_else(|| "unknown".to_string());
        warn!(tool = %attempt_name, error = %last_error, "Tool attempt failed");
    }

    error!(tool = %selected, attempts = attempt_names.len(), "Failover chain exhausted");
    ExecutionResult::failure(
        selected,
        format!(
            "All {} attempts failed, last error: {}",
            attempt_names.len(),
            last_error
        ),
        Duration::ZERO,
    )
}

/// Invoke one concrete tool with a timeout
async fn execute_single(
    catalog: &ToolCatalog,
    name: &str,
    params: &Map<String, Value>,
    timeout: Duration,
) -> ExecutionResult {
    let start = Instant::now();

    let Some(adapter) = catalog.adapter(name) else {
        let err = ConvokeError::ToolNotFound {
            name: name.to_string(),
        };
        return ExecutionResult::failure(name, err.to_string(), start.elapsed());
    };

    match tokio::time::timeout(timeout, adapter.execute(params, timeout)).await {
        Ok(Ok(response)) => {
            let duration = start.elapsed();
            if response.success {
                ExecutionResult {
                    tool_name: name.to_string(),
                    success: true,
                    payload: response.result,
                    duration,
                    error: None,
                    metadata: response.metadata.unwrap_or_default(),
                }
            } else {
                let err = ConvokeError::ToolExecutionError {
                    name: name.to_string(),
                    message: response
                        .error
                        .unwrap_or_else(|| "tool reported failure".to_string()),
                };
                ExecutionResult::failure(name, err.to_string(), duration)
            }
        }
        Ok(Err(e)) => {
            let err = ConvokeError::ToolExecutionError {
                name: name.to_string(),
                message: e.to_string(),
            };
            ExecutionResult::failure(name, err.to_string(), start.elapsed())
        }
        Err(_) => {
            // The invocation is abandoned; the underlying call may still be
            // running inside the adapter.
            let err = ConvokeError::ToolTimeout {
                name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            };
            ExecutionResult::failure(name, err.to_string(), start.elapsed())
        }
    }
}
