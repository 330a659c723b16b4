//! Shared data contracts for the page-order decision engine.
//!
//! Everything downstream treats `original_index` as the sole stable identity
//! of a page; positions in a slice change as strategies reorder, indices
//! never do.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a page's text came from during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Extracted,
    Ocr,
}

/// Extracted content of one physical page, addressed by its position in the
/// shuffled input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub original_index: usize,
    pub text: String,
    pub source: TextSource,
}

impl PageContent {
    pub fn new(original_index: usize, text: impl Into<String>, source: TextSource) -> Self {
        Self {
            original_index,
            text: text.into(),
            source,
        }
    }

    /// Character count of the extracted text.
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Identifiers for the ordering strategies, ranked by decreasing
/// determinism and increasing cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    PageNumber,
    BusinessLogic,
    Structural,
    DateSequence,
    Semantic,
    LlmReasoning,
    /// Terminal fallback emitted by the orchestrator, never by a strategy.
    Fallback,
}

impl StrategyKind {
    /// Execution and tie-break order: cheapest and most deterministic first.
    pub const IN_PRIORITY_ORDER: [StrategyKind; 6] = [
        StrategyKind::PageNumber,
        StrategyKind::BusinessLogic,
        StrategyKind::Structural,
        StrategyKind::DateSequence,
        StrategyKind::Semantic,
        StrategyKind::LlmReasoning,
    ];

    pub fn priority_rank(self) -> u8 {
        match self {
            StrategyKind::PageNumber => 0,
            StrategyKind::BusinessLogic => 1,
            StrategyKind::Structural => 2,
            StrategyKind::DateSequence => 3,
            StrategyKind::Semantic => 4,
            StrategyKind::LlmReasoning => 5,
            StrategyKind::Fallback => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::PageNumber => "page-number",
            StrategyKind::BusinessLogic => "business-logic",
            StrategyKind::Structural => "structural",
            StrategyKind::DateSequence => "date-sequence",
            StrategyKind::Semantic => "semantic",
            StrategyKind::LlmReasoning => "llm-reasoning",
            StrategyKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed total order over the pages of one document.
#[derive(Debug, Clone, Serialize)]
pub struct OrderingResult {
    /// Permutation of `[0, N)` in `original_index` terms.
    pub order: Vec<usize>,
    /// Self-assessed confidence in `[0, 1]`.
    pub confidence: f32,
    /// Short human-readable explanations, most significant first.
    pub reasoning: Vec<String>,
    pub method: StrategyKind,
    /// Per-transition confidences (length N-1) when the strategy can derive
    /// them from local signal; `None` means broadcast the aggregate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairwise: Option<Vec<f32>>,
}

impl OrderingResult {
    pub fn is_valid_permutation(&self, page_count: usize) -> bool {
        is_permutation(&self.order, page_count)
    }
}

/// Per-strategy score recorded for transparency.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CandidateScore {
    pub method: StrategyKind,
    pub confidence: f32,
}

/// Final orchestrator output for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub selected: OrderingResult,
    /// Every non-abstaining strategy, sorted by descending confidence.
    pub candidates: Vec<CandidateScore>,
    /// The identity sequence `[0..N)`, i.e. the shuffled arrival order.
    pub initial_order: Vec<usize>,
    /// Equal to `selected.order`; duplicated for callers that only read meta.
    pub final_order: Vec<usize>,
    /// Confidence of each adjacent transition in `final_order` (length N-1).
    pub pairwise_confidences: Vec<f32>,
    /// Short excerpt per original index, for diagnostics.
    pub summaries: BTreeMap<usize, String>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("page indices must form the contiguous range [0, {expected}); found duplicate or out-of-range index {index}")]
    NonContiguousIndices { expected: usize, index: usize },
}

/// Checks the caller contract: `original_index` values form `[0, N)` with
/// no duplicates.
pub fn validate_contiguous(pages: &[PageContent]) -> Result<(), ContentError> {
    let n = pages.len();
    let mut seen = vec![false; n];
    for page in pages {
        let index = page.original_index;
        if index >= n || seen[index] {
            return Err(ContentError::NonContiguousIndices { expected: n, index });
        }
        seen[index] = true;
    }
    Ok(())
}

/// True when `order` contains every index in `[0, n)` exactly once.
pub fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &index in order {
        if index >= n || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}
