//! Main orchestrator: select, execute, aggregate, report.
//!
//! One call drives the whole engine. Partial failures never surface as
//! errors; the report's `success` flag is true iff at least one tool
//! produced a successful result.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{OrchestrationReport, OrchestrationRequest, ToolMetadata};
use crate::oracle::ReasoningOracle;

use super::aggregator::ResultAggregator;
use super::catalog::ToolCatalog;
use super::ranking::OracleRanking;
use super::scheduler::{ExecutionScheduler, ExecutionStrategy};
use super::selector::ToolSelector;
use super::tracker::PerformanceTracker;

/// Composes the selector, scheduler, and aggregator into a single call
pub struct Orchestrator {
    catalog: Arc<ToolCatalog>,
    selector: ToolSelector,
    scheduler: ExecutionScheduler,
    aggregator: ResultAggregator,
}

impl Orchestrator {
    /// Orchestrator with deterministic ranking and no narrative oracle
    pub fn new(catalog: Arc<ToolCatalog>, tracker: Arc<PerformanceTracker>) -> Self {
        Self {
            selector: ToolSelector::rule_based(Arc::clone(&catalog), Arc::clone(&tracker)),
            scheduler: ExecutionScheduler::new(Arc::clone(&catalog), tracker),
            aggregator: ResultAggregator::new(),
            catalog,
        }
    }

    /// Orchestrator that ranks and synthesizes via the reasoning oracle.
    ///
    /// The oracle is strictly optional at runtime: ranking falls back to the
    /// deterministic rules and narratives to a template whenever it fails.
    pub fn with_oracle(
        catalog: Arc<ToolCatalog>,
        tracker: Arc<PerformanceTracker>,
        oracle: Arc<dyn ReasoningOracle>,
    ) -> Self {
        Self {
            selector: ToolSelector::new(
                Arc::clone(&catalog),
                Arc::clone(&tracker),
                Arc::new(OracleRanking::new(Arc::clone(&oracle))),
            ),
            scheduler: ExecutionScheduler::new(Arc::clone(&catalog), tracker),
            aggregator: ResultAggregator::with_oracle(oracle),
            catalog,
        }
    }

    /// Run one orchestration: select tools, execute them in waves, aggregate.
    ///
    /// `pinned_strategy` overrides execution-strategy auto-detection.
    #[instrument(skip(self, request), fields(task = ?request.task_type))]
    pub async fn run(
        &self,
        request: OrchestrationRequest,
        pinned_strategy: Option<ExecutionStrategy>,
    ) -> OrchestrationReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting orchestration run");

        let recommendations = self.selector.select(&request).await;

        if recommendations.is_empty() {
            warn!(%run_id, "Selection produced no candidate tools");
        }

        let selected: Vec<String> = recommendations
            .iter()
            .map(|r| r.tool_name.clone())
            .collect();

        let results = if selected.is_empty() {
            Vec::new()
        } else {
            let strategy = pinned_strategy.unwrap_or_else(|| {
                let metas: Vec<ToolMetadata> = selected
                    .iter()
                    .filter_map(|n| self.catalog.metadata(n))
                    .collect();
                ExecutionScheduler::detect_strategy(&metas)
            });
            self.scheduler.execute(&selected, strategy, &request).await
        };

        let aggregate = self
            .aggregator
            .aggregate(&results, request.synthesize_narrative)
            .await;

        let success = results.iter().any(|r| r.success);
        let finished_at = Utc::now();

        info!(
            %run_id,
            success,
            attempted = aggregate.counts.attempted,
            successful = aggregate.counts.successful,
            "Orchestration run finished"
        );

        OrchestrationReport {
            run_id,
            request,
            recommendations,
            results,
            aggregate,
            success,
            started_at,
            finished_at,
        }
    }
}
