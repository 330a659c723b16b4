//! Page-order decision engine for shuffled PDF documents.
//!
//! A document arrives as a PDF whose pages are in arbitrary order. The
//! engine extracts per-page text, runs a ranked set of ordering strategies
//! (printed page numbers, document-type conventions, structural anatomy,
//! date sequences, embedding similarity, model reasoning), and picks the
//! most confident proposal, falling back to the arrival order when no
//! strategy finds a signal. [`engine::Engine`] is the document-level entry
//! point; the `recollate` binary wraps it in a CLI and an HTTP server.

pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod ordering;
pub mod pdf;
pub mod report;
pub mod server;
pub mod services;
pub mod text;
