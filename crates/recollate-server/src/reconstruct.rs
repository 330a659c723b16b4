//! Provider contract between the HTTP surface and the ordering engine.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

/// One reconstruction request: the raw bytes of an uploaded PDF.
#[derive(Debug, Clone)]
pub struct ReconstructRequest {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Metadata describing how the final page order was decided.
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructMeta {
    pub page_count: usize,
    pub method: String,
    pub confidence: f32,
    pub initial_order: Vec<usize>,
    pub final_order: Vec<usize>,
    pub pairwise_confidences: Vec<f32>,
    pub candidates: Vec<CandidateMeta>,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMeta {
    pub method: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct ReconstructResponse {
    pub pdf: Vec<u8>,
    pub meta: ReconstructMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructErrorKind {
    InvalidInput,
    Internal,
}

#[derive(Debug)]
pub struct ReconstructError {
    pub kind: ReconstructErrorKind,
    pub message: String,
}

impl ReconstructError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: ReconstructErrorKind::InvalidInput,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ReconstructErrorKind::Internal,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReconstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ReconstructError {}

/// Implemented by the application layer; the router only knows this seam.
#[async_trait]
pub trait ReconstructProvider: Send + Sync + 'static {
    async fn reconstruct(
        &self,
        request: ReconstructRequest,
    ) -> Result<ReconstructResponse, ReconstructError>;
}
