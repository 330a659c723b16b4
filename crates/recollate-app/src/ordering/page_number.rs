//! Ordering from printed page numbers.
//!
//! The cheapest and most reliable signal when it exists: scan the footer
//! (then the header) of each page for a printed number, sort by it, and
//! interleave the unnumbered pages by arrival proximity.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::PageNumberConfig;
use crate::content::{OrderingResult, PageContent, StrategyKind};
use crate::ordering::{interleave_by_proximity, OrderingStrategy};

/// Characters scanned at each end of the page text.
const EDGE_CHARS: usize = 300;

// Tried in order; the first pattern that matches in a region wins, so the
// most explicit forms take precedence over a bare trailing integer.
static PAGE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page\s+(\d{1,4})\s+of\s+\d{1,4}").unwrap());
static PAGE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)page\s+(\d{1,4})\b").unwrap());
static DASHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*-\s*(\d{1,4})\s*-\s*$").unwrap());
static P_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*p\.?\s*(\d{1,4})\s*$").unwrap());
static N_OF_M: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(\d{1,4})\s+of\s+\d{1,4}\s*$").unwrap());
static BARE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(\d{1,4})\s*$").unwrap());

pub struct PageNumberStrategy {
    cfg: PageNumberConfig,
}

impl PageNumberStrategy {
    pub fn new(cfg: PageNumberConfig) -> Self {
        Self { cfg }
    }

    fn detect(&self, text: &str) -> Option<u32> {
        let chars: Vec<char> = text.chars().collect();
        let footer: String = chars[chars.len().saturating_sub(EDGE_CHARS)..]
            .iter()
            .collect();
        let header: String = chars[..chars.len().min(EDGE_CHARS)].iter().collect();
        detect_in_region(&footer).or_else(|| detect_in_region(&header))
    }
}

fn detect_in_region(region: &str) -> Option<u32> {
    for pattern in [&*PAGE_OF, &*PAGE_WORD, &*DASHED, &*P_DOT, &*N_OF_M, &*BARE_LINE] {
        // Take the last match in the region: footers put the page number
        // after any trailing body text.
        if let Some(captures) = pattern.captures_iter(region).last() {
            if let Ok(value) = captures[1].parse::<u32>() {
                return Some(value);
            }
        }
    }
    None
}

#[async_trait]
impl OrderingStrategy for PageNumberStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PageNumber
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let n = pages.len();
        let max_plausible = (2 * n) as u32;

        let mut numbered: Vec<(u32, usize)> = Vec::new();
        let mut unnumbered: Vec<usize> = Vec::new();
        let mut out_of_range = 0usize;
        for page in pages {
            match self.detect(&page.text) {
                Some(value) if value >= 1 && value <= max_plausible => {
                    numbered.push((value, page.original_index));
                }
                Some(value) => {
                    // Implausibly large or zero: treat as noise, not signal.
                    debug!(
                        page = page.original_index,
                        value, "discarding implausible page number"
                    );
                    out_of_range += 1;
                    unnumbered.push(page.original_index);
                }
                None => unnumbered.push(page.original_index),
            }
        }

        if numbered.is_empty() {
            return None;
        }

        let coverage = numbered.len() as f32 / n as f32;
        if coverage < self.cfg.min_coverage {
            debug!(coverage, "page-number coverage below threshold, abstaining");
            return None;
        }

        let mut value_counts: HashMap<u32, usize> = HashMap::new();
        for &(value, _) in &numbered {
            *value_counts.entry(value).or_insert(0) += 1;
        }
        let duplicates: usize = value_counts
            .values()
            .filter(|&&count| count > 1)
            .map(|&count| count - 1)
            .sum();

        // Duplicates keep their arrival order; the secondary sort key makes
        // that explicit and the shuffle reproducible.
        numbered.sort_by_key(|&(value, original)| (value, original));
        let anchored: Vec<usize> = numbered.iter().map(|&(_, original)| original).collect();
        unnumbered.sort_unstable();
        let order = interleave_by_proximity(&anchored, &unnumbered);

        let confidence = (coverage
            - duplicates as f32 * self.cfg.duplicate_penalty
            - out_of_range as f32 * self.cfg.out_of_range_penalty)
            .clamp(0.0, 1.0);
        if confidence <= 0.0 {
            return None;
        }

        let number_of: HashMap<usize, u32> =
            numbered.iter().map(|&(value, original)| (original, value)).collect();
        let pairwise: Vec<f32> = order
            .windows(2)
            .map(|pair| match (number_of.get(&pair[0]), number_of.get(&pair[1])) {
                // A gap of exactly one between printed numbers is a fully
                // confirmed transition; bigger gaps and unnumbered
                // neighbors fall back to the aggregate.
                (Some(&a), Some(&b)) if b == a + 1 => 1.0f32.min(confidence.max(0.9)),
                (Some(_), Some(_)) => confidence * 0.8,
                _ => confidence * 0.6,
            })
            .collect();

        let mut reasoning = vec![format!(
            "detected printed numbers on {}/{} pages ({:.0}% coverage)",
            numbered.len(),
            n,
            coverage * 100.0
        )];
        if duplicates > 0 {
            reasoning.push(format!("{duplicates} duplicate number(s), kept arrival order"));
        }
        if out_of_range > 0 {
            reasoning.push(format!("{out_of_range} implausible number(s) discarded"));
        }

        Some(OrderingResult {
            order,
            confidence,
            reasoning,
            method: StrategyKind::PageNumber,
            pairwise: Some(pairwise),
        })
    }
}
