//! Ordering from chronological references.
//!
//! Built for correspondence files and logs: each page is stamped with the
//! earliest parseable date it mentions, and dated pages sort by that stamp.
//! Dates are weak evidence of page order in most documents, so confidence
//! stays at a fixed moderate baseline even at full coverage.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::config::DateConfig;
use crate::content::{OrderingResult, PageContent, StrategyKind};
use crate::ordering::{interleave_by_proximity, OrderingStrategy};

static MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})",
    )
    .unwrap()
});
static DAY_OF_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:day\s+of\s+)?(january|february|march|april|may|june|july|august|september|october|november|december),?\s+(\d{4})",
    )
    .unwrap()
});
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

fn month_number(name: &str) -> Option<u32> {
    let number = match name.to_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(number)
}

/// Earliest parseable date mentioned in `text`, if any.
fn earliest_date(text: &str) -> Option<NaiveDate> {
    let mut earliest: Option<NaiveDate> = None;
    let mut consider = |candidate: Option<NaiveDate>| {
        if let Some(date) = candidate {
            if earliest.map_or(true, |current| date < current) {
                earliest = Some(date);
            }
        }
    };

    for captures in MONTH_NAME.captures_iter(text) {
        let month = month_number(&captures[1]);
        let day = captures[2].parse::<u32>().ok();
        let year = captures[3].parse::<i32>().ok();
        if let (Some(month), Some(day), Some(year)) = (month, day, year) {
            consider(NaiveDate::from_ymd_opt(year, month, day));
        }
    }
    for captures in DAY_OF_MONTH.captures_iter(text) {
        let day = captures[1].parse::<u32>().ok();
        let month = month_number(&captures[2]);
        let year = captures[3].parse::<i32>().ok();
        if let (Some(day), Some(month), Some(year)) = (day, month, year) {
            consider(NaiveDate::from_ymd_opt(year, month, day));
        }
    }
    for captures in ISO_DATE.captures_iter(text) {
        let year = captures[1].parse::<i32>().ok();
        let month = captures[2].parse::<u32>().ok();
        let day = captures[3].parse::<u32>().ok();
        if let (Some(year), Some(month), Some(day)) = (year, month, day) {
            consider(NaiveDate::from_ymd_opt(year, month, day));
        }
    }
    for captures in NUMERIC_DATE.captures_iter(text) {
        // Month-first; day-first inputs are out of scope for now.
        let month = captures[1].parse::<u32>().ok();
        let day = captures[2].parse::<u32>().ok();
        let year = captures[3].parse::<i32>().ok();
        if let (Some(month), Some(day), Some(year)) = (month, day, year) {
            consider(NaiveDate::from_ymd_opt(year, month, day));
        }
    }
    earliest
}

pub struct DateSequenceStrategy {
    cfg: DateConfig,
}

impl DateSequenceStrategy {
    pub fn new(cfg: DateConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl OrderingStrategy for DateSequenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DateSequence
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let mut dated: Vec<(NaiveDate, usize)> = Vec::new();
        let mut undated: Vec<usize> = Vec::new();
        for page in pages {
            match earliest_date(&page.text) {
                Some(date) => dated.push((date, page.original_index)),
                None => undated.push(page.original_index),
            }
        }

        let fraction = dated.len() as f32 / pages.len() as f32;
        if dated.len() < self.cfg.min_count || fraction < self.cfg.min_fraction {
            debug!(
                dated = dated.len(),
                fraction, "insufficient dated pages, abstaining"
            );
            return None;
        }

        dated.sort_by_key(|&(date, original)| (date, original));
        let anchored: Vec<usize> = dated.iter().map(|&(_, original)| original).collect();
        undated.sort_unstable();
        let order = interleave_by_proximity(&anchored, &undated);

        let confidence = self.cfg.baseline_confidence;
        let date_of: HashMap<usize, NaiveDate> =
            dated.iter().map(|&(date, original)| (original, date)).collect();
        let pairwise: Vec<f32> = order
            .windows(2)
            .map(|pair| match (date_of.get(&pair[0]), date_of.get(&pair[1])) {
                // Transitions between nearby dates are tighter evidence than
                // month-sized jumps.
                (Some(&a), Some(&b)) => {
                    let gap_days = (b - a).num_days().unsigned_abs();
                    if gap_days <= 7 {
                        confidence
                    } else {
                        confidence * 0.8
                    }
                }
                _ => confidence * 0.6,
            })
            .collect();

        Some(OrderingResult {
            order,
            confidence,
            reasoning: vec![format!(
                "sorted by earliest mentioned date on {}/{} pages",
                dated.len(),
                pages.len()
            )],
            method: StrategyKind::DateSequence,
            pairwise: Some(pairwise),
        })
    }
}
