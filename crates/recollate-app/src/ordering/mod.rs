//! Page-ordering strategies.
//!
//! Each strategy inspects the extracted page texts and either proposes a
//! complete ordering with a confidence score, or abstains. Abstention is the
//! normal outcome for a strategy whose signal is absent from a document; it
//! is never an error.

use async_trait::async_trait;

use crate::content::{OrderingResult, PageContent, StrategyKind};

mod business_logic;
mod date_sequence;
mod llm;
mod orchestrator;
mod page_number;
mod semantic;
mod structural;

pub use business_logic::BusinessLogicStrategy;
pub use date_sequence::DateSequenceStrategy;
pub use llm::LlmReasoningStrategy;
pub use orchestrator::{Orchestrator, OrderingError};
pub use page_number::PageNumberStrategy;
pub use semantic::SemanticStrategy;
pub use structural::StructuralStrategy;

#[async_trait]
pub trait OrderingStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Proposes an ordering for `pages`, or `None` to abstain.
    ///
    /// The returned `order` must be a permutation of the pages' original
    /// indices; the orchestrator discards anything else.
    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult>;
}

/// Merges pages a strategy could not anchor back into an anchored sequence.
///
/// Each unanchored page is inserted immediately after the nearest anchored
/// predecessor from the original arrival order, preserving whatever local
/// adjacency the shuffle left intact. Pages with no anchored predecessor go
/// to the front, in arrival order.
pub(crate) fn interleave_by_proximity(anchored: &[usize], unanchored: &[usize]) -> Vec<usize> {
    let mut merged: Vec<usize> = anchored.to_vec();
    for &page in unanchored {
        // Already-inserted pages count as anchors for the ones after them,
        // so a run of consecutive unanchored pages stays in arrival order.
        let insert_at = merged
            .iter()
            .enumerate()
            .filter(|&(_, &candidate)| candidate < page)
            .max_by_key(|&(_, &candidate)| candidate)
            .map(|(pos, _)| pos + 1)
            .unwrap_or(0);
        merged.insert(insert_at, page);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_places_pages_after_nearest_predecessor() {
        // Anchored order 2, 0; pages 1 and 3 fall back to arrival adjacency.
        let merged = interleave_by_proximity(&[2, 0], &[1, 3]);
        assert_eq!(merged, vec![2, 3, 0, 1]);
    }

    #[test]
    fn interleave_fronts_pages_without_predecessor() {
        let merged = interleave_by_proximity(&[3, 4], &[0]);
        assert_eq!(merged, vec![0, 3, 4]);
    }

    #[test]
    fn interleave_with_no_unanchored_is_identity() {
        let merged = interleave_by_proximity(&[1, 0, 2], &[]);
        assert_eq!(merged, vec![1, 0, 2]);
    }
}
