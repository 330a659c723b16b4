//! Rule-driven page classification.
//!
//! Scoring is purely lexical: lowercase substring hits against a profile's
//! section rules, plus regex boosts. Classification is stateless and
//! deterministic, the same page always yields the same label.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{DocumentTypeProfile, RuleCatalog, SectionRule};
use crate::config::ClassifierConfig;
use crate::content::PageContent;

/// Outcome of classifying a single page against one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PageClassification {
    pub section_name: String,
    pub priority: i32,
    /// Unnormalized score, used for intra-section ranking.
    pub raw_score: f32,
    /// Score normalized by the section's maximum attainable score, in [0, 1].
    pub score: f32,
}

pub struct Classifier {
    catalog: Arc<RuleCatalog>,
    cfg: ClassifierConfig,
}

impl Classifier {
    pub fn new(catalog: Arc<RuleCatalog>, cfg: ClassifierConfig) -> Self {
        Self { catalog, cfg }
    }

    /// Picks the document-type profile whose keyword vocabulary best covers
    /// the sampled page texts. Returns `None` when no profile clears the
    /// minimum hit threshold.
    ///
    /// Ties go to the profile declared first in the catalog.
    pub fn detect_profile(&self, pages: &[PageContent]) -> Option<&DocumentTypeProfile> {
        let samples: Vec<String> = pages
            .iter()
            .map(|page| {
                let sample: String = page.text.chars().take(self.cfg.sample_chars).collect();
                sample.to_lowercase()
            })
            .collect();

        let mut best: Option<(&DocumentTypeProfile, usize)> = None;
        for profile in &self.catalog.profiles {
            let hits: usize = samples
                .iter()
                .map(|sample| {
                    profile
                        .detection_terms()
                        .filter(|term| sample.contains(term))
                        .count()
                })
                .sum();
            debug!(profile = %profile.name, hits, "profile detection scan");
            if hits >= self.cfg.min_profile_hits
                && best.map_or(true, |(_, best_hits)| hits > best_hits)
            {
                best = Some((profile, hits));
            }
        }
        best.map(|(profile, _)| profile)
    }

    /// Classifies one page against a profile. Returns `None` when no section
    /// rule produces a positive score.
    pub fn classify_page(
        &self,
        profile: &DocumentTypeProfile,
        page: &PageContent,
    ) -> Option<PageClassification> {
        let text = page.text.to_lowercase();

        let mut best: Option<(&SectionRule, f32)> = None;
        for rule in &profile.sections {
            let Some(raw) = self.score_section(rule, &text) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((current, current_raw)) => {
                    match raw.total_cmp(&current_raw) {
                        std::cmp::Ordering::Greater => true,
                        std::cmp::Ordering::Less => false,
                        // Equal scores: prefer the earlier section in the
                        // document's logical flow, then declaration order.
                        std::cmp::Ordering::Equal => (rule.priority, rule.declaration_index)
                            .lt(&(current.priority, current.declaration_index)),
                    }
                }
            };
            if better {
                best = Some((rule, raw));
            }
        }

        best.map(|(rule, raw)| {
            let ceiling = rule.indicators.len() as f32 * rule.weight
                + rule.boost_patterns.len() as f32 * self.cfg.boost_increment;
            let score = if ceiling > 0.0 {
                (raw / ceiling).min(1.0)
            } else {
                0.0
            };
            PageClassification {
                section_name: rule.section_name.clone(),
                priority: rule.priority,
                raw_score: raw,
                score,
            }
        })
    }

    fn score_section(&self, rule: &SectionRule, text: &str) -> Option<f32> {
        if !rule.required_any.is_empty()
            && !rule.required_any.iter().any(|term| text.contains(term))
        {
            return None;
        }

        let indicator_hits = rule
            .indicators
            .iter()
            .filter(|term| text.contains(term.as_str()))
            .count();
        let boost_hits = rule
            .boost_patterns
            .iter()
            .filter(|pattern| pattern.is_match(text))
            .count();

        let mut raw = indicator_hits as f32 * rule.weight
            + boost_hits as f32 * self.cfg.boost_increment;
        // A satisfied required-term gate is itself evidence: a page that
        // mentions the gating term but none of the indicators still carries
        // a minimal claim on the section.
        if raw == 0.0 && !rule.required_any.is_empty() {
            raw = rule.weight;
        }
        (raw > 0.0).then_some(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextSource;

    fn page(index: usize, text: &str) -> PageContent {
        PageContent::new(index, text.to_string(), TextSource::Extracted)
    }

    fn classifier() -> Classifier {
        Classifier::new(
            RuleCatalog::builtin().expect("builtin catalog"),
            ClassifierConfig::default(),
        )
    }

    #[test]
    fn detects_loan_profile_from_samples() {
        let classifier = classifier();
        let pages = vec![
            page(0, "LOAN AGREEMENT between the Borrower and the Lender"),
            page(1, "ARTICLE I - Definitions of principal and interest"),
            page(2, "IN WITNESS WHEREOF the parties execute this signature page"),
        ];
        let profile = classifier.detect_profile(&pages).expect("profile");
        assert_eq!(profile.name, "loan_agreement");
    }

    #[test]
    fn abstains_below_hit_threshold() {
        let classifier = classifier();
        let pages = vec![page(0, "weather report for tuesday"), page(1, "sports scores")];
        assert!(classifier.detect_profile(&pages).is_none());
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = classifier();
        let catalog = RuleCatalog::builtin().expect("builtin catalog");
        let profile = &catalog.profiles[0];
        let body = page(3, "ARTICLE IV. The borrower shall repay the principal amount.");
        let first = classifier.classify_page(profile, &body).expect("label");
        let second = classifier.classify_page(profile, &body).expect("label");
        assert_eq!(first, second);
    }

    #[test]
    fn signing_page_outranks_body_for_signature_text() {
        let classifier = classifier();
        let catalog = RuleCatalog::builtin().expect("builtin catalog");
        let profile = &catalog.profiles[0];
        let signing = page(8, "IN WITNESS WHEREOF, signature of the authorized officer");
        let label = classifier.classify_page(profile, &signing).expect("label");
        assert_eq!(label.section_name, "signing");
    }

    #[test]
    fn unmatched_page_yields_none() {
        let classifier = classifier();
        let catalog = RuleCatalog::builtin().expect("builtin catalog");
        let profile = &catalog.profiles[0];
        let blank = page(5, "");
        assert!(classifier.classify_page(profile, &blank).is_none());
    }

    #[test]
    fn required_term_alone_carries_minimal_signal() {
        let yaml = r#"
profiles:
  - name: demo
    sections:
      - section_name: exhibit
        priority: 1
        weight: 2.0
        indicators: ["schedule"]
        required_any: ["exhibit"]
"#;
        let catalog = RuleCatalog::from_yaml(yaml).expect("catalog compiles");
        let classifier = Classifier::new(catalog.clone(), ClassifierConfig::default());
        let profile = &catalog.profiles[0];
        // Mentions the gating term but none of the indicators.
        let label = classifier
            .classify_page(profile, &page(0, "exhibit a follows on the next page"))
            .expect("label");
        assert_eq!(label.section_name, "exhibit");
        assert!((label.raw_score - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn normalized_score_is_capped() {
        let classifier = classifier();
        let catalog = RuleCatalog::builtin().expect("builtin catalog");
        let profile = &catalog.profiles[0];
        let text = profile.sections[0]
            .indicators
            .join(" ")
            .repeat(3);
        let label = classifier
            .classify_page(profile, &page(0, &text))
            .expect("label");
        assert!(label.score <= 1.0);
    }
}
