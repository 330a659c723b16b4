//! Ordering from embedding similarity.
//!
//! Embeds every page, then walks a greedy nearest-neighbor chain: the page
//! least similar to everything else opens the document (openers are
//! outliers; body pages all resemble each other), and each step appends the
//! unvisited page most similar to the current tail. Confidence is the mean
//! similarity across the chosen transitions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::SemanticConfig;
use crate::content::{OrderingResult, PageContent, StrategyKind};
use crate::ordering::OrderingStrategy;
use crate::services::EmbedClient;

/// Stand-in text for pages with no extractable content, so the embedding
/// request stays positionally aligned.
const EMPTY_PAGE_TEXT: &str = "[empty page]";

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = embeddings.len();
    let mut matrix = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine(&embeddings[i], &embeddings[j]);
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }
    matrix
}

/// Greedy chain over the similarity matrix; returns positions (not original
/// indices) plus the similarity of each chosen transition.
fn greedy_chain(matrix: &[Vec<f32>]) -> (Vec<usize>, Vec<f32>) {
    let n = matrix.len();
    let opener = (0..n)
        .min_by(|&a, &b| {
            let mean_a: f32 = matrix[a].iter().sum::<f32>() / (n - 1) as f32;
            let mean_b: f32 = matrix[b].iter().sum::<f32>() / (n - 1) as f32;
            mean_a.total_cmp(&mean_b).then(a.cmp(&b))
        })
        .unwrap_or(0);

    let mut visited = vec![false; n];
    visited[opener] = true;
    let mut chain = vec![opener];
    let mut transitions = Vec::with_capacity(n - 1);
    while chain.len() < n {
        let current = *chain.last().unwrap_or(&opener);
        let Some(next) = (0..n)
            .filter(|&candidate| !visited[candidate])
            .max_by(|&a, &b| {
                matrix[current][a]
                    .total_cmp(&matrix[current][b])
                    .then(b.cmp(&a))
            })
        else {
            break;
        };
        visited[next] = true;
        transitions.push(matrix[current][next]);
        chain.push(next);
    }
    (chain, transitions)
}

pub struct SemanticStrategy {
    client: Option<Arc<dyn EmbedClient>>,
    cfg: SemanticConfig,
}

impl SemanticStrategy {
    pub fn new(client: Option<Arc<dyn EmbedClient>>, cfg: SemanticConfig) -> Self {
        Self { client, cfg }
    }
}

#[async_trait]
impl OrderingStrategy for SemanticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Semantic
    }

    async fn attempt(&self, pages: &[PageContent]) -> Option<OrderingResult> {
        let client = self.client.as_ref()?;
        if pages.len() < self.cfg.min_pages {
            debug!(pages = pages.len(), "too few pages for chain construction");
            return None;
        }

        let texts: Vec<String> = pages
            .iter()
            .map(|page| {
                if page.text.trim().is_empty() {
                    EMPTY_PAGE_TEXT.to_string()
                } else {
                    page.text.clone()
                }
            })
            .collect();

        let embeddings = match client.embed(&texts).await {
            Ok(embeddings) => embeddings,
            Err(err) => {
                warn!(error = %err, "embedding request failed, abstaining");
                return None;
            }
        };
        if embeddings.len() != pages.len() {
            warn!("embedding count mismatch, abstaining");
            return None;
        }

        let matrix = similarity_matrix(&embeddings);
        let (chain, transitions) = greedy_chain(&matrix);
        let order: Vec<usize> = chain
            .iter()
            .map(|&position| pages[position].original_index)
            .collect();

        let confidence = if transitions.is_empty() {
            0.0
        } else {
            (transitions.iter().sum::<f32>() / transitions.len() as f32).clamp(0.0, 1.0)
        };
        if confidence <= 0.0 {
            return None;
        }

        Some(OrderingResult {
            order,
            confidence,
            reasoning: vec![format!(
                "greedy similarity chain over {} pages, mean transition similarity {:.2}",
                pages.len(),
                confidence
            )],
            method: StrategyKind::Semantic,
            pairwise: Some(transitions.iter().map(|&sim| sim.clamp(0.0, 1.0)).collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextSource;
    use crate::services::ProviderError;

    struct FixedEmbeds(Vec<Vec<f32>>);

    #[async_trait]
    impl EmbedClient for FixedEmbeds {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbeds;

    #[async_trait]
    impl EmbedClient for FailingEmbeds {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Err(ProviderError::Malformed("boom".to_string()))
        }
    }

    fn page(index: usize, text: &str) -> PageContent {
        PageContent::new(index, text.to_string(), TextSource::Extracted)
    }

    fn pages(n: usize) -> Vec<PageContent> {
        (0..n).map(|i| page(i, &format!("page {i}"))).collect()
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn chain_follows_similarity_gradient() {
        // Unit vectors rotating in small steps; arrival order is shuffled.
        // The outlier opener heuristic picks an end of the arc and the chain
        // walks it monotonically.
        let angle = |deg: f32| vec![deg.to_radians().cos(), deg.to_radians().sin()];
        let embeddings = vec![angle(20.0), angle(0.0), angle(30.0), angle(10.0)];
        let strategy = SemanticStrategy::new(
            Some(Arc::new(FixedEmbeds(embeddings))),
            SemanticConfig::default(),
        );
        let result = strategy.attempt(&pages(4)).await.expect("ordering");
        assert!(result.order == vec![1, 3, 0, 2] || result.order == vec![2, 0, 3, 1]);
        assert!(result.confidence > 0.9);
    }

    #[tokio::test]
    async fn abstains_without_a_client() {
        let strategy = SemanticStrategy::new(None, SemanticConfig::default());
        assert!(strategy.attempt(&pages(5)).await.is_none());
    }

    #[tokio::test]
    async fn abstains_below_minimum_pages() {
        let strategy = SemanticStrategy::new(
            Some(Arc::new(FixedEmbeds(vec![vec![1.0], vec![1.0]]))),
            SemanticConfig::default(),
        );
        assert!(strategy.attempt(&pages(2)).await.is_none());
    }

    #[tokio::test]
    async fn provider_failure_means_abstention() {
        let strategy = SemanticStrategy::new(
            Some(Arc::new(FailingEmbeds)),
            SemanticConfig::default(),
        );
        assert!(strategy.attempt(&pages(4)).await.is_none());
    }
}
