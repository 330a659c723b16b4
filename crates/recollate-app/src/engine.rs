//! Document-level entry point: PDF in, ordered PDF + decision record out.

use std::sync::Arc;

use tracing::info;

use crate::catalog::RuleCatalog;
use crate::config::AppConfig;
use crate::content::ProcessingResult;
use crate::error::AppError;
use crate::ordering::Orchestrator;
use crate::pdf::{extract_page_texts, reorder_pdf};
use crate::services::{build_engine_context, EngineContext};

pub struct Engine {
    orchestrator: Orchestrator,
}

impl Engine {
    /// Builds the engine from configuration: loads the rule catalog (a bad
    /// catalog is fatal here, at startup) and wires up whichever model
    /// clients the environment provides.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, AppError> {
        let catalog = match &cfg.catalog.path {
            Some(path) => RuleCatalog::load(path)?,
            None => RuleCatalog::builtin()?,
        };
        let ctx = build_engine_context(&cfg.providers);
        Ok(Self::new(cfg, &ctx, catalog))
    }

    pub fn new(cfg: &AppConfig, ctx: &EngineContext, catalog: Arc<RuleCatalog>) -> Self {
        Self {
            orchestrator: Orchestrator::new(&cfg.engine, ctx, catalog),
        }
    }

    /// Extracts page texts and decides the logical order without touching
    /// the PDF itself.
    pub async fn analyze(&self, pdf: &[u8]) -> Result<ProcessingResult, AppError> {
        let pages = extract_page_texts(pdf)?;
        let result = self.orchestrator.order_pages(&pages).await?;
        info!(
            pages = pages.len(),
            method = %result.selected.method,
            confidence = result.selected.confidence,
            "page order decided"
        );
        Ok(result)
    }

    /// Full reconstruction: decide the order, then rebuild the PDF in it.
    pub async fn reconstruct(&self, pdf: &[u8]) -> Result<(Vec<u8>, ProcessingResult), AppError> {
        let result = self.analyze(pdf).await?;
        let reordered = reorder_pdf(pdf, &result.final_order)?;
        Ok((reordered, result))
    }
}
