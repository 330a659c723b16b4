//! External model services.
//!
//! The two expensive strategies talk to hosted models through the trait
//! seams defined here; everything else in the engine is offline. Both seams
//! are optional at runtime: without an API key the engine simply runs the
//! deterministic strategies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::config::ProviderConfig;

mod embed;
mod reasoning;

pub use embed::GeminiEmbedClient;
pub use reasoning::GeminiReasoningClient;

const API_KEY_VARS: [&str; 2] = ["GOOGLE_AI_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait EmbedClient: Send + Sync {
    /// Embeds each text into a fixed-dimension vector, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Ordering proposal returned by a reasoning model.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposedOrder {
    pub order: Vec<usize>,
    pub confidence: f32,
    #[serde(default)]
    pub rationale: String,
}

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Asks the model to order the given per-page summaries, indexed by
    /// original position.
    async fn propose_order(&self, summaries: &[String]) -> Result<ProposedOrder, ProviderError>;
}

/// Clients shared by the strategies; `None` fields disable the
/// corresponding strategy.
#[derive(Clone, Default)]
pub struct EngineContext {
    pub embed: Option<Arc<dyn EmbedClient>>,
    pub reasoning: Option<Arc<dyn ReasoningClient>>,
}

fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|key| !key.is_empty()))
}

/// Builds the context from the environment. Missing credentials are normal
/// and reported once at startup, not per document.
pub fn build_engine_context(cfg: &ProviderConfig) -> EngineContext {
    match api_key_from_env() {
        Some(key) => EngineContext {
            embed: Some(Arc::new(GeminiEmbedClient::new(
                key.clone(),
                cfg.embedding_model.clone(),
                cfg.embedding_dim,
            ))),
            reasoning: Some(Arc::new(GeminiReasoningClient::new(
                key,
                cfg.reasoning_model.clone(),
            ))),
        },
        None => {
            info!(
                "no Google AI API key in environment; semantic and reasoning strategies disabled"
            );
            EngineContext::default()
        }
    }
}
