//! # doctag-search
//!
//! Search-index collaborator backends for doctag.
//!
//! The ingestion pipeline talks to the index through the
//! [`doctag_core::SearchIndex`] trait. This crate provides two
//! implementations:
//! - [`HttpSearchIndex`]: an Elasticsearch-compatible HTTP client
//! - [`MemoryIndex`]: a deterministic in-memory index for tests and
//!   single-process deployments

pub mod client;
pub mod memory;

pub use client::HttpSearchIndex;
pub use memory::MemoryIndex;

// Re-export the trait and its types for convenience
pub use doctag_core::{IndexFields, SearchIndex, TermStatistics, TermStats};
