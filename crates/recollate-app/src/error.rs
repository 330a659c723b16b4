//! Application-level error type shared across the binary and services.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::AppConfigError;
use crate::content::ContentError;
use crate::ordering::OrderingError;
use crate::pdf::PdfError;
use crate::services::ProviderError;
use recollate_server::ServerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ConfigLoad(#[from] AppConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
