//! Ordering from generic document anatomy.
//!
//! Profile-free fallback to the catalog-driven strategy: recognizes covers,
//! tables of contents, and signature blocks from universal cues and packs
//! the bulk of the document between them.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::config::StructuralConfig;
use crate::content::{OrderingResult, PageContent, StrategyKind};
use crate::ordering::OrderingStrategy;

static TOC_DOTTED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\.{4,}\s*\d+\s*$").unwrap());
static SIGNATURE_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)in\s+witness\s+whereof|signature|duly\s+executed|_{5,}").unwrap()
});
static TOC_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)table\s+of\s+contents|^\s*contents\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageRole {
    Cover,
    TableOfContents,
    Body,
    Signature,
    Unknown,
}

pub struct StructuralStrategy {
    cfg: StructuralConfig,
}

impl StructuralStrategy {
    pub fn new(cfg: StructuralConfig) -> Self {
        Self { cfg }
    }

    fn role_of(&self, page: &PageContent) -> PageRole {
        let text = page.text.trim();
        if TOC_CUE.is_match(text) || TOC_DOTTED_LINE.find_iter(text).count() >= 3 {
            return PageRole::TableOfContents;
        }
        if SIGNATURE_CUE.is_match(text) {
            return PageRole::Signature;
        }
        let length = text.chars().count();
        // Covers are short and shouty: little text, much of it uppercase.
        if length > 0 && length <= self.cfg.cover_max_chars {
            let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
            let upper = letters.iter().filter(|c| c.is_uppercase()).count();
            if !letters.is_empty() && upper * 2 >= letters.len() {
                return PageRole::Cover;
            }
        }
        if length >= self.cfg.body_min_chars {
            return PageRole::Body;
        }
        PageRole::Unknown
    }
}

#[async_trait]
impl OrderingStrategy for StructuralStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Structural
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let mut covers: Vec<usize> = Vec::new();
        let mut tocs: Vec<usize> = Vec::new();
        let mut middle: Vec<usize> = Vec::new();
        let mut signatures: Vec<usize> = Vec::new();
        let mut distinctive = 0usize;
        for page in pages {
            match self.role_of(page) {
                PageRole::Cover => {
                    covers.push(page.original_index);
                    distinctive += 1;
                }
                PageRole::TableOfContents => {
                    tocs.push(page.original_index);
                    distinctive += 1;
                }
                PageRole::Signature => {
                    signatures.push(page.original_index);
                    distinctive += 1;
                }
                // Body and unknown pages share the middle; nothing here can
                // order them relative to each other.
                PageRole::Body | PageRole::Unknown => middle.push(page.original_index),
            }
        }

        // The floor never drops below one: with no distinctive page at all
        // the strategy has no signal and must abstain.
        if distinctive < self.cfg.min_distinct_roles.max(1) {
            return None;
        }

        let mut order = covers;
        order.extend(tocs);
        order.extend(middle);
        order.extend(signatures);

        let confidence = (distinctive as f32 / pages.len() as f32).clamp(0.0, 1.0);
        let reasoning = vec![format!(
            "anchored {} of {} pages by structural role (covers/contents/signatures)",
            distinctive,
            pages.len()
        )];

        Some(OrderingResult {
            order,
            confidence,
            reasoning,
            method: StrategyKind::Structural,
            pairwise: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextSource;

    fn page(index: usize, text: &str) -> PageContent {
        PageContent::new(index, text.to_string(), TextSource::Extracted)
    }

    fn strategy() -> StructuralStrategy {
        StructuralStrategy::new(StructuralConfig::default())
    }

    #[tokio::test]
    async fn cover_toc_body_signature_layout() {
        let body = "lorem ipsum dolor sit amet ".repeat(40);
        let pages = vec![
            page(0, &body),
            page(1, "IN WITNESS WHEREOF the parties have duly executed this agreement\n\n______________"),
            page(2, "SERVICES AGREEMENT\n\nACME CORP\n\nMARCH 2024"),
            page(3, "Table of Contents\nIntroduction....1\nScope.......2"),
        ];
        let result = strategy().attempt(&pages).await.expect("ordering");
        assert_eq!(result.order, vec![2, 3, 0, 1]);
        assert!((result.confidence - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn abstains_when_nothing_is_distinctive() {
        let body = "plain paragraph text ".repeat(60);
        let pages = vec![page(0, &body), page(1, &body)];
        assert!(strategy().attempt(&pages).await.is_none());
    }

    #[tokio::test]
    async fn respects_raised_distinct_role_floor() {
        let body = "narrative paragraph content ".repeat(40);
        let pages = vec![page(0, &body), page(1, "ANNUAL REPORT\n\nFY 2023")];
        let strict = StructuralStrategy::new(StructuralConfig {
            min_distinct_roles: 2,
            ..StructuralConfig::default()
        });
        assert!(strict.attempt(&pages).await.is_none());
        // The default floor of one distinctive page still commits.
        assert!(strategy().attempt(&pages).await.is_some());
    }

    #[tokio::test]
    async fn middle_pages_keep_arrival_order() {
        let body = "narrative paragraph content ".repeat(40);
        let pages = vec![
            page(0, &body),
            page(1, "ANNUAL REPORT\n\nFY 2023"),
            page(2, &body),
        ];
        let result = strategy().attempt(&pages).await.expect("ordering");
        assert_eq!(result.order, vec![1, 0, 2]);
    }
}
