//! HTTP surface bootstrap: exposes the engine behind the server crate's
//! provider seam.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::content::ProcessingResult;
use crate::engine::Engine;
use crate::error::AppError;
use crate::ordering::OrderingError;
use recollate_server::{
    serve, CandidateMeta, ReconstructError, ReconstructMeta, ReconstructProvider,
    ReconstructRequest, ReconstructResponse,
};

pub struct EngineProvider {
    engine: Engine,
}

impl EngineProvider {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

fn meta_from_result(result: &ProcessingResult) -> ReconstructMeta {
    ReconstructMeta {
        page_count: result.final_order.len(),
        method: result.selected.method.to_string(),
        confidence: result.selected.confidence,
        initial_order: result.initial_order.clone(),
        final_order: result.final_order.clone(),
        pairwise_confidences: result.pairwise_confidences.clone(),
        candidates: result
            .candidates
            .iter()
            .map(|candidate| CandidateMeta {
                method: candidate.method.to_string(),
                confidence: candidate.confidence,
            })
            .collect(),
        reasoning: result.selected.reasoning.clone(),
    }
}

#[async_trait]
impl ReconstructProvider for EngineProvider {
    async fn reconstruct(
        &self,
        request: ReconstructRequest,
    ) -> Result<ReconstructResponse, ReconstructError> {
        if let Some(filename) = &request.filename {
            info!(filename = %filename, bytes = request.bytes.len(), "reconstruct request");
        }
        match self.engine.reconstruct(&request.bytes).await {
            Ok((pdf, result)) => Ok(ReconstructResponse {
                pdf,
                meta: meta_from_result(&result),
            }),
            // Unreadable input is the caller's problem; everything else is
            // ours and stays opaque on the wire.
            Err(AppError::Pdf(err)) => Err(ReconstructError::invalid_input(err.to_string())),
            Err(AppError::Ordering(OrderingError::EmptyDocument)) => {
                Err(ReconstructError::invalid_input("document has no pages"))
            }
            Err(err) => {
                error!(error = %err, "reconstruction failed");
                Err(ReconstructError::internal("reconstruction failed"))
            }
        }
    }
}

/// Runs the HTTP server until shutdown.
pub async fn run(cfg: &AppConfig) -> Result<(), AppError> {
    let engine = Engine::from_config(cfg)?;
    let provider: Arc<dyn ReconstructProvider> = Arc::new(EngineProvider::new(engine));
    serve(cfg.server.clone(), provider).await?;
    Ok(())
}
