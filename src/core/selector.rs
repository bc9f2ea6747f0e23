//! Tool selector: proposes ranked candidate tools for a task.
//!
//! Selection never fails: an unusable ranking strategy falls back to the
//! deterministic rules, and an empty candidate set yields an empty list that
//! callers must handle explicitly.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::{
    OrchestrationRequest, SelectionStrategy, TaskType, ToolCategory, ToolMetadata,
    ToolRecommendation,
};

use super::catalog::ToolCatalog;
use super::ranking::{RankingStrategy, RuleBasedRanking};
use super::tracker::PerformanceTracker;

/// Keyword to category rule table, checked against the task description
const KEYWORD_CATEGORIES: &[(&str, &[ToolCategory])] = &[
    ("subdomain", &[ToolCategory::Recon]),
    ("recon", &[ToolCategory::Recon, ToolCategory::Osint]),
    ("discover", &[ToolCategory::Recon]),
    ("enumerate", &[ToolCategory::Recon, ToolCategory::Scan]),
    ("port", &[ToolCategory::Scan, ToolCategory::Network]),
    ("scan", &[ToolCategory::Scan]),
    ("vulnerab", &[ToolCategory::Scan, ToolCategory::Analysis]),
    ("whois", &[ToolCategory::Osint]),
    ("osint", &[ToolCategory::Osint]),
    ("leak", &[ToolCategory::Osint]),
    ("dns", &[ToolCategory::Recon, ToolCategory::Network]),
    ("traceroute", &[ToolCategory::Network]),
    ("ping", &[ToolCategory::Network]),
    ("http", &[ToolCategory::Web]),
    ("website", &[ToolCategory::Web]),
    ("crawl", &[ToolCategory::Web]),
    ("screenshot", &[ToolCategory::Web]),
    ("analy", &[ToolCategory::Analysis]),
    ("correlat", &[ToolCategory::Analysis]),
    ("report", &[ToolCategory::Report]),
    ("summar", &[ToolCategory::Report]),
];

/// Selects and ranks candidate tools for a task
pub struct ToolSelector {
    catalog: Arc<ToolCatalog>,
    tracker: Arc<PerformanceTracker>,
    ranking: Arc<dyn RankingStrategy>,
}

impl ToolSelector {
    /// Create a selector with the given primary ranking strategy
    pub fn new(
        catalog: Arc<ToolCatalog>,
        tracker: Arc<PerformanceTracker>,
        ranking: Arc<dyn RankingStrategy>,
    ) -> Self {
        Self {
            catalog,
            tracker,
            ranking,
        }
    }

    /// Selector that ranks with the deterministic rules only
    pub fn rule_based(catalog: Arc<ToolCatalog>, tracker: Arc<PerformanceTracker>) -> Self {
        Self::new(catalog, tracker, Arc::new(RuleBasedRanking))
    }

    /// Propose ranked tools for the request
    #[instrument(skip(self, request), fields(task = ?request.task_type, strategy = ?request.strategy))]
    pub async fn select(&self, request: &OrchestrationRequest) -> Vec<ToolRecommendation> {
        let categories = Self::infer_categories(request.task_type, &request.description);
        debug!(?categories, "Inferred candidate categories");

        let candidates = self.gather_candidates(&categories, &request.preferred_tools);
        if candidates.is_empty() {
            debug!("No candidate tools for task");
            return Vec::new();
        }

        let mut recommendations = match self
            .ranking
            .rank(&request.description, &candidates, request.strategy)
            .await
        {
            Ok(recs) => recs,
            Err(e) => {
                warn!(error = %e, "Ranking strategy unusable, using rule-based fallback");
                RuleBasedRanking
                    .rank(&request.description, &candidates, request.strategy)
                    .await
                    .unwrap_or_default()
            }
        };

        self.refine_with_history(&mut recommendations, request.strategy);

        // Stable sort keeps first-seen order on confidence ties.
        recommendations.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(request.max_tools);
        recommendations
    }

    /// Infer candidate categories from the task type and description keywords
    pub fn infer_categories(task_type: TaskType, description: &str) -> Vec<ToolCategory> {
        let mut categories: Vec<ToolCategory> = Vec::new();
        let mut seen: HashSet<ToolCategory> = HashSet::new();
        let mut push = |cat: ToolCategory, categories: &mut Vec<ToolCategory>| {
            if seen.insert(cat) {
                categories.push(cat);
            }
        };

        let from_type: &[ToolCategory] = match task_type {
            TaskType::Reconnaissance => &[ToolCategory::Recon],
            TaskType::Scanning => &[ToolCategory::Scan],
            TaskType::Osint => &[ToolCategory::Osint],
            TaskType::Analysis => &[ToolCategory::Analysis],
            TaskType::Reporting => &[ToolCategory::Report],
            TaskType::General => &[],
        };
        for &cat in from_type {
            push(cat, &mut categories);
        }

        let lowered = description.to_lowercase();
        for (keyword, cats) in KEYWORD_CATEGORIES {
            if lowered.contains(keyword) {
                for &cat in *cats {
                    push(cat, &mut categories);
                }
            }
        }

        if categories.is_empty() {
            categories.push(ToolCategory::Generic);
        }
        categories
    }

    /// Gather candidate metadata, preferred names stably moved to the front
    fn gather_candidates(
        &self,
        categories: &[ToolCategory],
        preferred: &[String],
    ) -> Vec<ToolMetadata> {
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for &category in categories {
            for name in self.catalog.by_category(category) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }

        if !preferred.is_empty() {
            let (front, back): (Vec<String>, Vec<String>) = names
                .into_iter()
                .partition(|n| preferred.contains(n));
            names = front.into_iter().chain(back).collect();
        }

        names
            .into_iter()
            .filter_map(|n| self.catalog.metadata(&n))
            .collect()
    }

    /// Fold tracker history into the ranked recommendations.
    ///
    /// Composition rule: under `Reliable` the task-fit confidence is
    /// multiplied by the observed success rate, or by the metadata seed rate
    /// for tools with no history yet; under every strategy, observed averages
    /// overwrite the static estimates and a note with the observed success
    /// rate is appended. History never adds a second score.
    fn refine_with_history(
        &self,
        recommendations: &mut [ToolRecommendation],
        strategy: SelectionStrategy,
    ) {
        for rec in recommendations.iter_mut() {
            let Some(metrics) = self.tracker.metrics(&rec.tool_name) else {
                if strategy == SelectionStrategy::Reliable {
                    if let Some(meta) = self.catalog.metadata(&rec.tool_name) {
                        rec.confidence *= meta.seed_success_rate;
                        rec.clamp_confidence();
                    }
                }
                continue;
            };

            if strategy == SelectionStrategy::Reliable {
                rec.confidence *= metrics.success_rate;
                rec.clamp_confidence();
            }

            rec.estimated_secs = metrics.avg_duration_secs;
            rec.estimated_cost_usd = metrics.avg_cost_usd;
            rec.reason.push_str(&format!(
                " (observed success rate {:.0}% over {} runs)",
                metrics.success_rate * 100.0,
                metrics.executions
            ));
        }
    }
}
