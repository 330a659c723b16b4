//! PDF text extraction and reassembly via Pdfium.

use std::env;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::{Pdfium, PdfiumError};
use thiserror::Error;
use tracing::warn;

use crate::content::{is_permutation, PageContent, TextSource};
use crate::text::cleanup_text;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to load Pdfium runtime: {0}")]
    Library(#[from] PdfiumError),

    #[error("failed to load PDF document: {0}")]
    Document(#[source] PdfiumError),

    #[error("failed to copy page {page_index} into the output document: {source}")]
    CopyPage {
        page_index: usize,
        #[source]
        source: PdfiumError,
    },

    #[error("failed to serialize the output document: {0}")]
    Save(#[source] PdfiumError),

    #[error("order is not a permutation of the document's {page_count} pages")]
    InvalidOrder { page_count: usize },
}

/// Extracts per-page text from a PDF byte slice.
///
/// A page whose text layer cannot be read is returned with empty text
/// rather than failing the document; the ordering strategies treat such
/// pages as unanchored. Scanned pages need an external OCR pass, whose
/// output callers can feed in as [`TextSource::Ocr`] pages.
pub fn extract_page_texts(bytes: &[u8]) -> Result<Vec<PageContent>, PdfError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(PdfError::Document)?;

    let mut pages = Vec::with_capacity(document.pages().len() as usize);
    for (index, page) in document.pages().iter().enumerate() {
        let text = match page.text() {
            Ok(text) => cleanup_text(&text.all()),
            Err(source) => {
                warn!(page = index, error = %source, "text extraction failed, treating page as empty");
                String::new()
            }
        };
        pages.push(PageContent::new(index, text, TextSource::Extracted));
    }
    Ok(pages)
}

/// Rebuilds the PDF with its pages in `order` (original indices, first page
/// first).
pub fn reorder_pdf(bytes: &[u8], order: &[usize]) -> Result<Vec<u8>, PdfError> {
    let pdfium = load_pdfium()?;
    let original = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(PdfError::Document)?;

    let page_count = original.pages().len() as usize;
    if !is_permutation(order, page_count) {
        return Err(PdfError::InvalidOrder { page_count });
    }

    let mut output = pdfium.create_new_pdf().map_err(PdfError::Document)?;
    for (destination, &source_index) in order.iter().enumerate() {
        output
            .pages_mut()
            .copy_page_from_document(&original, source_index as u16, destination as u16)
            .map_err(|source| PdfError::CopyPage {
                page_index: source_index,
                source,
            })?;
    }
    output.save_to_bytes().map_err(PdfError::Save)
}

fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(result) = try_bind_from_env("PDFIUM_LIBRARY_PATH") {
        return result;
    }

    for var in ["PDFIUM_LIB_DIR", "PDFIUM_DYNAMIC_LIB_PATH", "PDFIUM_LIBRARY_DIR"] {
        if let Some(result) = try_bind_from_env(var) {
            if result.is_ok() {
                return result;
            }
        }
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(primary_err) => match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(_) => Err(primary_err),
        },
    }
}

fn try_bind_from_env(var: &str) -> Option<Result<Pdfium, PdfiumError>> {
    let value = env::var_os(var)?;
    try_bind_from_path(PathBuf::from(&value))
}

fn try_bind_from_path(path: impl AsRef<Path>) -> Option<Result<Pdfium, PdfiumError>> {
    let path = path.as_ref();
    if path.is_dir() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        Some(Pdfium::bind_to_library(lib_path).map(Pdfium::new))
    } else if path.exists() {
        Some(Pdfium::bind_to_library(path).map(Pdfium::new))
    } else {
        None
    }
}
