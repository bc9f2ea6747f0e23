//! Candidate ranking strategies.
//!
//! Ranking is behind a pluggable trait. The oracle-backed implementation
//! validates the oracle's reply against a strict schema and returns a typed
//! `RankingError` on any violation; the selector then routes to the
//! deterministic rule-based ranking, which never fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{CostTier, SelectionStrategy, ToolMetadata, ToolRecommendation};
use crate::error::RankingError;
use crate::oracle::ReasoningOracle;

/// A way of turning candidate metadata into ranked recommendations.
///
/// Candidates arrive in preference order; implementations may reorder but
/// must return one recommendation per candidate at most.
#[async_trait]
pub trait RankingStrategy: Send + Sync {
    async fn rank(
        &self,
        description: &str,
        candidates: &[ToolMetadata],
        strategy: SelectionStrategy,
    ) -> Result<Vec<ToolRecommendation>, RankingError>;
}

/// Deterministic fallback ranking.
///
/// Keeps preference order, assigns confidence 0.9 decreasing by 0.1 per rank
/// with a floor of 0.5. Under `CostOptimized`, free-tier tools are stably
/// moved to the front before confidences are assigned; under `Efficient`,
/// candidates are stably ordered by their estimated execution time.
pub struct RuleBasedRanking;

impl RuleBasedRanking {
    fn recommendation(meta: &ToolMetadata, rank: usize) -> ToolRecommendation {
        let confidence = (0.9 - 0.1 * rank as f64).max(0.5);
        ToolRecommendation {
            tool_name: meta.name.clone(),
            confidence,
            reason: format!("Rule-based rank {} for category match", rank + 1),
            execution_mode: meta.execution_mode,
            estimated_secs: meta.avg_execution_secs,
            estimated_cost_usd: meta.cost_tier.estimate_usd(),
        }
    }
}

#[async_trait]
impl RankingStrategy for RuleBasedRanking {
    async fn rank(
        &self,
        _description: &str,
        candidates: &[ToolMetadata],
        strategy: SelectionStrategy,
    ) -> Result<Vec<ToolRecommendation>, RankingError> {
        let mut ordered: Vec<&ToolMetadata> = candidates.iter().collect();

        match strategy {
            SelectionStrategy::CostOptimized => {
                // Stable partition: free tools first, relative order preserved.
                let (free, paid): (Vec<_>, Vec<_>) = ordered
                    .into_iter()
                    .partition(|m| m.cost_tier == CostTier::Free);
                ordered = free.into_iter().chain(paid).collect();
            }
            SelectionStrategy::Efficient => {
                // Stable sort: faster estimated tools first.
                ordered.sort_by(|a, b| {
                    a.avg_execution_secs
                        .partial_cmp(&b.avg_execution_secs)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            _ => {}
        }

        Ok(ordered
            .iter()
            .enumerate()
            .map(|(rank, meta)| Self::recommendation(meta, rank))
            .collect())
    }
}

/// Row shape the oracle reply must match
#[derive(Debug, Deserialize)]
struct RankedRow {
    tool: String,
    confidence: f64,
    reason: String,
}

/// Ranking backed by the reasoning oracle
pub struct OracleRanking {
    oracle: Arc<dyn ReasoningOracle>,
}

impl OracleRanking {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self { oracle }
    }

    fn build_prompt(description: &str, candidates: &[ToolMetadata]) -> String {
        let mut prompt = String::from(
            "Rank the following tools for the task below. Reply with ONLY a JSON \
             array of {\"tool\", \"confidence\", \"reason\"} objects, confidence \
             in [0,1], best tool first.\n\nTask: ",
        );
        prompt.push_str(description);
        prompt.push_str("\n\nTools:\n");
        for meta in candidates {
            prompt.push_str(&format!(
                "- {} (category {:?}, mode {:?}, avg {}s, cost {:?}, auth {})\n",
                meta.name,
                meta.category,
                meta.execution_mode,
                meta.avg_execution_secs,
                meta.cost_tier,
                meta.requires_auth
            ));
        }
        prompt
    }

    /// Strip an optional markdown code fence around the reply
    fn strip_fence(reply: &str) -> &str {
        let trimmed = reply.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open.strip_suffix("```").unwrap_or(without_open).trim()
    }

    /// Validate the reply against the expected schema and candidate set
    fn parse_reply(
        reply: &str,
        candidates: &[ToolMetadata],
    ) -> Result<Vec<ToolRecommendation>, RankingError> {
        let body = Self::strip_fence(reply);

        let rows: Vec<RankedRow> = serde_json::from_str(body).map_err(|e| {
            if serde_json::from_str::<serde_json::Value>(body).is_ok() {
                RankingError::SchemaMismatch(e.to_string())
            } else {
                RankingError::MalformedReply(e.to_string())
            }
        })?;

        if rows.is_empty() {
            return Err(RankingError::SchemaMismatch(
                "reply ranked zero tools".to_string(),
            ));
        }

        let mut recommendations = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = candidates
                .iter()
                .find(|m| m.name == row.tool)
                .ok_or_else(|| RankingError::UnknownTool(row.tool.clone()))?;

            if !(0.0..=1.0).contains(&row.confidence) {
                return Err(RankingError::SchemaMismatch(format!(
                    "confidence {} for '{}' outside [0, 1]",
                    row.confidence, row.tool
                )));
            }

            recommendations.push(ToolRecommendation {
                tool_name: row.tool,
                confidence: row.confidence,
                reason: row.reason,
                execution_mode: meta.execution_mode,
                estimated_secs: meta.avg_execution_secs,
                estimated_cost_usd: meta.cost_tier.estimate_usd(),
            });
        }

        Ok(recommendations)
    }
}

#[async_trait]
impl RankingStrategy for OracleRanking {
    async fn rank(
        &self,
        description: &str,
        candidates: &[ToolMetadata],
        _strategy: SelectionStrategy,
    ) -> Result<Vec<ToolRecommendation>, RankingError> {
        let prompt = Self::build_prompt(description, candidates);

        let reply = self
            .oracle
            .complete(&prompt)
            .await
            .map_err(|e| RankingError::OracleUnavailable(e.to_string()))?;

        debug!(reply_len = reply.len(), "Received oracle ranking reply");
        Self::parse_reply(&reply, candidates)
    }
}
