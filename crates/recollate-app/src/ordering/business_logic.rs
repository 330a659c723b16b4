//! Ordering from document-type conventions.
//!
//! Detects a document-type profile from the rule catalog, labels each page
//! with a section, and sorts by the profile's section flow. Knows nothing
//! about page numbers; this is the strategy that puts a cover page before a
//! signature page even when neither is numbered.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::classify::Classifier;
use crate::config::BusinessConfig;
use crate::content::{OrderingResult, PageContent, StrategyKind};
use crate::ordering::OrderingStrategy;

pub struct BusinessLogicStrategy {
    classifier: Arc<Classifier>,
    cfg: BusinessConfig,
}

impl BusinessLogicStrategy {
    pub fn new(classifier: Arc<Classifier>, cfg: BusinessConfig) -> Self {
        Self { classifier, cfg }
    }
}

#[async_trait]
impl OrderingStrategy for BusinessLogicStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BusinessLogic
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let profile = self.classifier.detect_profile(pages)?;
        debug!(profile = %profile.name, "document-type profile detected");

        // (priority, -raw via sort key trick, arrival) for classified pages.
        let mut classified: Vec<(i32, f32, usize, String)> = Vec::new();
        let mut unclassified: Vec<usize> = Vec::new();
        for page in pages {
            match self.classifier.classify_page(profile, page) {
                Some(label) => classified.push((
                    label.priority,
                    label.raw_score,
                    page.original_index,
                    label.section_name,
                )),
                None => unclassified.push(page.original_index),
            }
        }

        if classified.is_empty() {
            return None;
        }
        let fraction = classified.len() as f32 / pages.len() as f32;
        if fraction < self.cfg.min_classified_fraction {
            debug!(fraction, "classified fraction below threshold, abstaining");
            return None;
        }

        // Within a section, stronger matches lead; arrival order breaks the
        // remaining ties deterministically.
        classified.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        unclassified.sort_unstable();
        let mut order: Vec<usize> = classified.iter().map(|entry| entry.2).collect();
        order.extend(&unclassified);

        let mut reasoning = vec![
            format!("matched document-type profile '{}'", profile.name),
            format!(
                "classified {}/{} pages into sections",
                classified.len(),
                pages.len()
            ),
        ];
        if let (Some(first), Some(last)) = (classified.first(), classified.last()) {
            reasoning.push(format!(
                "section flow runs '{}' through '{}'",
                first.3, last.3
            ));
        }
        if !unclassified.is_empty() {
            reasoning.push(format!(
                "{} unclassified page(s) appended in arrival order",
                unclassified.len()
            ));
        }

        Some(OrderingResult {
            order,
            confidence: fraction.clamp(0.0, 1.0),
            reasoning,
            method: StrategyKind::BusinessLogic,
            pairwise: None,
        })
    }
}
