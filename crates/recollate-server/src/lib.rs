//! HTTP surface for the page-order reconstruction service.

pub mod config;
pub mod reconstruct;
mod server;

pub use config::*;
pub use reconstruct::*;
pub use server::{ServerError, build_api_router, serve};
