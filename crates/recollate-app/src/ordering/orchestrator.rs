//! Strategy selection and fallback policy.
//!
//! Strategies run in a fixed priority order, cheapest first. A result at or
//! above the high-confidence cutoff ends the run immediately; otherwise the
//! highest confidence wins, with ties going to the earlier strategy. A
//! document no strategy can read falls back to the arrival order at zero
//! confidence, so the caller always gets a usable permutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::RuleCatalog;
use crate::classify::Classifier;
use crate::config::EngineConfig;
use crate::content::{
    validate_contiguous, CandidateScore, ContentError, OrderingResult, PageContent,
    ProcessingResult, StrategyKind,
};
use crate::ordering::{
    BusinessLogicStrategy, DateSequenceStrategy, LlmReasoningStrategy, OrderingStrategy,
    PageNumberStrategy, SemanticStrategy, StructuralStrategy,
};
use crate::services::EngineContext;
use crate::text::excerpt;

#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("document has no pages")]
    EmptyDocument,
    #[error(transparent)]
    Contract(#[from] ContentError),
}

pub struct Orchestrator {
    strategies: Vec<Box<dyn OrderingStrategy>>,
    high_confidence_cutoff: f32,
    summary_chars: usize,
}

impl Orchestrator {
    pub fn new(cfg: &EngineConfig, ctx: &EngineContext, catalog: Arc<RuleCatalog>) -> Self {
        let classifier = Arc::new(Classifier::new(catalog, cfg.classifier));
        let strategies: Vec<Box<dyn OrderingStrategy>> = vec![
            Box::new(PageNumberStrategy::new(cfg.page_number)),
            Box::new(BusinessLogicStrategy::new(classifier, cfg.business)),
            Box::new(StructuralStrategy::new(cfg.structural)),
            Box::new(DateSequenceStrategy::new(cfg.dates)),
            Box::new(SemanticStrategy::new(ctx.embed.clone(), cfg.semantic)),
            Box::new(LlmReasoningStrategy::new(
                ctx.reasoning.clone(),
                cfg.llm,
                cfg.summary_chars,
            )),
        ];
        debug_assert_eq!(strategies.len(), StrategyKind::IN_PRIORITY_ORDER.len());
        Self {
            strategies,
            high_confidence_cutoff: cfg.high_confidence_cutoff,
            summary_chars: cfg.summary_chars,
        }
    }

    /// Test seam: run an arbitrary strategy stack under a given cutoff.
    pub fn with_strategies(
        strategies: Vec<Box<dyn OrderingStrategy>>,
        high_confidence_cutoff: f32,
        summary_chars: usize,
    ) -> Self {
        Self {
            strategies,
            high_confidence_cutoff,
            summary_chars,
        }
    }

    pub async fn order_pages(
        &self,
        pages: &[PageContent],
    ) -> Result<ProcessingResult, OrderingError> {
        if pages.is_empty() {
            return Err(OrderingError::EmptyDocument);
        }
        validate_contiguous(pages)?;
        let n = pages.len();
        let initial_order: Vec<usize> = (0..n).collect();

        let mut candidates: Vec<CandidateScore> = Vec::new();
        let mut best: Option<OrderingResult> = None;
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let Some(result) = strategy.attempt(pages).await else {
                debug!(strategy = %kind, "strategy abstained");
                continue;
            };
            if !result.is_valid_permutation(n) {
                warn!(strategy = %kind, "discarding invalid permutation");
                continue;
            }
            debug!(strategy = %kind, confidence = result.confidence, "strategy proposed an order");
            candidates.push(CandidateScore {
                method: kind,
                confidence: result.confidence,
            });

            if result.confidence >= self.high_confidence_cutoff {
                info!(strategy = %kind, confidence = result.confidence, "high-confidence result, stopping early");
                return Ok(self.finish(pages, initial_order, result, candidates));
            }
            // Strictly greater: on equal confidence the earlier (cheaper,
            // more deterministic) strategy keeps the win.
            if best
                .as_ref()
                .map_or(true, |current| result.confidence > current.confidence)
            {
                best = Some(result);
            }
        }

        let selected = best.unwrap_or_else(|| {
            info!("every strategy abstained, falling back to arrival order");
            OrderingResult {
                order: initial_order.clone(),
                confidence: 0.0,
                reasoning: vec![
                    "no ordering signal detected; pages left in arrival order".to_string(),
                ],
                method: StrategyKind::Fallback,
                pairwise: None,
            }
        });
        Ok(self.finish(pages, initial_order, selected, candidates))
    }

    fn finish(
        &self,
        pages: &[PageContent],
        initial_order: Vec<usize>,
        selected: OrderingResult,
        mut candidates: Vec<CandidateScore>,
    ) -> ProcessingResult {
        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.method.priority_rank().cmp(&b.method.priority_rank()))
        });

        let transitions = pages.len().saturating_sub(1);
        let pairwise_confidences = match &selected.pairwise {
            Some(pairwise) if pairwise.len() == transitions => pairwise.clone(),
            Some(pairwise) => {
                warn!(
                    got = pairwise.len(),
                    expected = transitions,
                    "pairwise detail has wrong length, broadcasting aggregate"
                );
                vec![selected.confidence; transitions]
            }
            None => vec![selected.confidence; transitions],
        };

        let summaries: BTreeMap<usize, String> = pages
            .iter()
            .map(|page| (page.original_index, excerpt(&page.text, self.summary_chars)))
            .collect();

        let final_order = selected.order.clone();
        ProcessingResult {
            selected,
            candidates,
            initial_order,
            final_order,
            pairwise_confidences,
            summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextSource;
    use async_trait::async_trait;

    struct FixedStrategy {
        kind: StrategyKind,
        result: Option<OrderingResult>,
    }

    impl FixedStrategy {
        fn proposing(kind: StrategyKind, order: Vec<usize>, confidence: f32) -> Self {
            Self {
                kind,
                result: Some(OrderingResult {
                    order,
                    confidence,
                    reasoning: vec![format!("{kind} stub")],
                    method: kind,
                    pairwise: None,
                }),
            }
        }

        fn abstaining(kind: StrategyKind) -> Self {
            Self { kind, result: None }
        }
    }

    #[async_trait]
    impl OrderingStrategy for FixedStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn attempt(&self, _pages: &[PageContent]) -> Option<OrderingResult> {
            self.result.clone()
        }
    }

    fn pages(n: usize) -> Vec<PageContent> {
        (0..n)
            .map(|i| PageContent::new(i, format!("page {i}"), TextSource::Extracted))
            .collect()
    }

    fn orchestrator(strategies: Vec<Box<dyn OrderingStrategy>>) -> Orchestrator {
        Orchestrator::with_strategies(strategies, 0.90, 400)
    }

    #[tokio::test]
    async fn highest_confidence_wins() {
        let orchestrator = orchestrator(vec![
            Box::new(FixedStrategy::proposing(
                StrategyKind::PageNumber,
                vec![0, 1, 2],
                0.5,
            )),
            Box::new(FixedStrategy::proposing(
                StrategyKind::Structural,
                vec![2, 1, 0],
                0.7,
            )),
        ]);
        let result = orchestrator.order_pages(&pages(3)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::Structural);
        assert_eq!(result.final_order, vec![2, 1, 0]);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[0].method, StrategyKind::Structural);
    }

    #[tokio::test]
    async fn equal_confidence_prefers_the_earlier_strategy() {
        let orchestrator = orchestrator(vec![
            Box::new(FixedStrategy::proposing(
                StrategyKind::PageNumber,
                vec![0, 1, 2],
                0.7,
            )),
            Box::new(FixedStrategy::proposing(
                StrategyKind::Semantic,
                vec![2, 1, 0],
                0.7,
            )),
        ]);
        let result = orchestrator.order_pages(&pages(3)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::PageNumber);
    }

    #[tokio::test]
    async fn high_confidence_short_circuits_later_strategies() {
        let orchestrator = orchestrator(vec![
            Box::new(FixedStrategy::proposing(
                StrategyKind::PageNumber,
                vec![1, 0, 2],
                0.95,
            )),
            Box::new(FixedStrategy::proposing(
                StrategyKind::LlmReasoning,
                vec![2, 1, 0],
                0.99,
            )),
        ]);
        let result = orchestrator.order_pages(&pages(3)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::PageNumber);
        // The later strategy never ran, so it is not a recorded candidate.
        assert_eq!(result.candidates.len(), 1);
    }

    #[tokio::test]
    async fn all_abstaining_falls_back_to_arrival_order() {
        let orchestrator = orchestrator(vec![
            Box::new(FixedStrategy::abstaining(StrategyKind::PageNumber)),
            Box::new(FixedStrategy::abstaining(StrategyKind::Semantic)),
        ]);
        let result = orchestrator.order_pages(&pages(4)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::Fallback);
        assert_eq!(result.final_order, vec![0, 1, 2, 3]);
        assert_eq!(result.selected.confidence, 0.0);
        assert!(!result.selected.reasoning.is_empty());
        assert!(result.candidates.is_empty());
    }

    #[tokio::test]
    async fn invalid_permutations_are_discarded() {
        let orchestrator = orchestrator(vec![
            Box::new(FixedStrategy::proposing(
                StrategyKind::PageNumber,
                vec![0, 0, 1],
                0.99,
            )),
            Box::new(FixedStrategy::proposing(
                StrategyKind::Structural,
                vec![1, 2, 0],
                0.4,
            )),
        ]);
        let result = orchestrator.order_pages(&pages(3)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::Structural);
        assert_eq!(result.candidates.len(), 1);
    }

    #[tokio::test]
    async fn empty_document_is_an_error() {
        let orchestrator = orchestrator(vec![]);
        let err = orchestrator.order_pages(&[]).await.expect_err("must fail");
        assert!(matches!(err, OrderingError::EmptyDocument));
    }

    #[tokio::test]
    async fn single_page_without_signal_is_a_zero_confidence_fallback() {
        let orchestrator = orchestrator(vec![Box::new(FixedStrategy::abstaining(
            StrategyKind::PageNumber,
        ))]);
        let result = orchestrator.order_pages(&pages(1)).await.expect("result");
        assert_eq!(result.final_order, vec![0]);
        assert_eq!(result.selected.method, StrategyKind::Fallback);
        assert_eq!(result.selected.confidence, 0.0);
        assert!(result.pairwise_confidences.is_empty());
    }

    #[tokio::test]
    async fn single_page_can_still_be_claimed_by_a_strategy() {
        let orchestrator = orchestrator(vec![Box::new(FixedStrategy::proposing(
            StrategyKind::PageNumber,
            vec![0],
            0.95,
        ))]);
        let result = orchestrator.order_pages(&pages(1)).await.expect("result");
        assert_eq!(result.selected.method, StrategyKind::PageNumber);
        assert_eq!(result.final_order, vec![0]);
    }

    #[tokio::test]
    async fn non_contiguous_indices_are_rejected() {
        let bad = vec![
            PageContent::new(0, "a", TextSource::Extracted),
            PageContent::new(2, "b", TextSource::Extracted),
        ];
        let err = orchestrator(vec![]).order_pages(&bad).await.expect_err("must fail");
        assert!(matches!(err, OrderingError::Contract(_)));
    }

    #[tokio::test]
    async fn broadcast_pairwise_matches_transition_count() {
        let orchestrator = orchestrator(vec![Box::new(FixedStrategy::proposing(
            StrategyKind::Structural,
            vec![3, 2, 1, 0],
            0.45,
        ))]);
        let result = orchestrator.order_pages(&pages(4)).await.expect("result");
        assert_eq!(result.pairwise_confidences, vec![0.45, 0.45, 0.45]);
        assert_eq!(result.initial_order, vec![0, 1, 2, 3]);
    }
}
