//! Human-readable ordering diagnostics for the `explain` command.

use std::fmt::Write;

use crate::content::ProcessingResult;

/// Transitions weaker than this are flagged in the report.
const LOW_CONFIDENCE: f32 = 0.5;

/// Renders a plain-text diagnostics report for one ordering decision.
pub fn render(result: &ProcessingResult) -> String {
    let mut out = String::new();
    let n = result.final_order.len();

    let _ = writeln!(out, "pages: {n}");
    let _ = writeln!(
        out,
        "selected: {} (confidence {:.2})",
        result.selected.method, result.selected.confidence
    );
    for line in &result.selected.reasoning {
        let _ = writeln!(out, "  - {line}");
    }

    let _ = writeln!(out, "initial order: {:?}", result.initial_order);
    let _ = writeln!(out, "final order:   {:?}", result.final_order);
    if result.final_order == result.initial_order && n > 1 {
        let _ = writeln!(out, "note: order unchanged from arrival order");
    }

    if !result.candidates.is_empty() {
        let _ = writeln!(out, "candidates:");
        for candidate in &result.candidates {
            let _ = writeln!(out, "  {:<16} {:.2}", candidate.method.to_string(), candidate.confidence);
        }
    }

    if !result.pairwise_confidences.is_empty() {
        let sum: f32 = result.pairwise_confidences.iter().sum();
        let avg = sum / result.pairwise_confidences.len() as f32;
        let min = result
            .pairwise_confidences
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        let max = result
            .pairwise_confidences
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let weak = result
            .pairwise_confidences
            .iter()
            .filter(|&&c| c < LOW_CONFIDENCE)
            .count();
        let _ = writeln!(
            out,
            "transitions: avg {avg:.2}, min {min:.2}, max {max:.2}, {weak} below {LOW_CONFIDENCE:.1}"
        );
        for (position, (&confidence, pair)) in result
            .pairwise_confidences
            .iter()
            .zip(result.final_order.windows(2))
            .enumerate()
        {
            if confidence < LOW_CONFIDENCE {
                let _ = writeln!(
                    out,
                    "  weak transition #{position}: page {} -> page {} ({confidence:.2})",
                    pair[0], pair[1]
                );
            }
        }
    }

    if let Some(&first) = result.final_order.first() {
        if let Some(summary) = result.summaries.get(&first) {
            let head: String = summary.chars().take(80).collect();
            let _ = writeln!(out, "first page ({first}): {head}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CandidateScore, OrderingResult, StrategyKind};
    use std::collections::BTreeMap;

    fn sample() -> ProcessingResult {
        ProcessingResult {
            selected: OrderingResult {
                order: vec![1, 0, 2],
                confidence: 0.72,
                reasoning: vec!["example signal".to_string()],
                method: StrategyKind::PageNumber,
                pairwise: None,
            },
            candidates: vec![CandidateScore {
                method: StrategyKind::PageNumber,
                confidence: 0.72,
            }],
            initial_order: vec![0, 1, 2],
            final_order: vec![1, 0, 2],
            pairwise_confidences: vec![0.72, 0.31],
            summaries: BTreeMap::from([(1, "opening page text".to_string())]),
        }
    }

    #[test]
    fn report_flags_weak_transitions() {
        let report = render(&sample());
        assert!(report.contains("selected: page-number"));
        assert!(report.contains("weak transition #1"));
        assert!(report.contains("1 below 0.5"));
    }

    #[test]
    fn report_names_the_first_page() {
        let report = render(&sample());
        assert!(report.contains("first page (1): opening page text"));
    }
}
