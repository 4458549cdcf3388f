//! lectern - A command-line client for a document search and Q&A service
//!
//! This crate provides:
//! - A typed HTTP client with tag-invalidated response caching
//! - The document status model and its six-step processing timeline
//! - Usage against document and storage limits
//! - CLI commands for documents, workspaces, users, search and questions

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod listing;
pub mod models;
pub mod progress;
pub mod refresh;
pub mod session;
pub mod status;
pub mod upload;
pub mod usage;
pub mod validate;

pub use api::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
