//! # doctag-core
//!
//! Core types, traits, and abstractions for the doctag document-tagging
//! pipeline.
//!
//! This crate provides the foundational data structures, the error type,
//! collaborator trait definitions, and the tag reconciliation engine that
//! the other doctag crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::IngestConfig;
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tag_name, normalize_tag_names, TagReconciler};
pub use traits::*;
pub use validation::{validate_upload, ALLOWED_CONTENT_TYPES};
