//! Ordering by a reasoning model.
//!
//! Last resort for documents whose order needs world knowledge the other
//! strategies lack. The model sees truncated page summaries and returns a
//! permutation with a self-reported confidence, which is validated and
//! capped here so corpus-level determinism still wins ties upstream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::LlmConfig;
use crate::content::{is_permutation, OrderingResult, PageContent, StrategyKind};
use crate::ordering::OrderingStrategy;
use crate::services::ReasoningClient;
use crate::text::excerpt;

pub struct LlmReasoningStrategy {
    client: Option<Arc<dyn ReasoningClient>>,
    cfg: LlmConfig,
    summary_chars: usize,
}

impl LlmReasoningStrategy {
    pub fn new(
        client: Option<Arc<dyn ReasoningClient>>,
        cfg: LlmConfig,
        summary_chars: usize,
    ) -> Self {
        Self {
            client,
            cfg,
            summary_chars,
        }
    }
}

#[async_trait]
impl OrderingStrategy for LlmReasoningStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LlmReasoning
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let client = self.client.as_ref()?;
        // A single page has only one order; no point spending a model call.
        if pages.len() < 2 {
            return None;
        }

        // Summaries are indexed by slice position; the prompt labels them
        // with original indices via this lookup.
        let mut by_index: Vec<&PageContent> = pages.iter().collect();
        by_index.sort_by_key(|page| page.original_index);
        let summaries: Vec<String> = by_index
            .iter()
            .map(|page| excerpt(&page.text, self.summary_chars))
            .collect();

        let timeout = Duration::from_secs(self.cfg.timeout_secs);
        let proposed = match tokio::time::timeout(timeout, client.propose_order(&summaries)).await
        {
            Ok(Ok(proposed)) => proposed,
            Ok(Err(err)) => {
                warn!(error = %err, "reasoning request failed, abstaining");
                return None;
            }
            Err(_) => {
                warn!(timeout_secs = self.cfg.timeout_secs, "reasoning request timed out");
                return None;
            }
        };

        if !is_permutation(&proposed.order, pages.len()) {
            warn!(order = ?proposed.order, "model returned a non-permutation, abstaining");
            return None;
        }

        let confidence = proposed
            .confidence
            .clamp(0.0, 1.0)
            .min(self.cfg.max_confidence);
        let mut reasoning = vec!["ordering proposed by reasoning model".to_string()];
        if !proposed.rationale.is_empty() {
            reasoning.push(proposed.rationale);
        }

        Some(OrderingResult {
            order: proposed.order,
            confidence,
            reasoning,
            method: StrategyKind::LlmReasoning,
            pairwise: None,
        })
    }
}
