//! # doctag-ingest
//!
//! End-to-end ingestion pipeline for doctag.
//!
//! [`IngestService`] drives one upload through a strictly sequential state
//! machine: validate, store the blob, persist metadata, extract text,
//! index, extract keywords, reconcile and link tags. The failure policy is
//! asymmetric around the metadata persist: everything before it fails the
//! request outright with no partial state, everything after it degrades to
//! empty/absent enrichment fields while the document stays durable.

pub mod service;
pub mod test_fixtures;
pub mod text;

pub use service::IngestService;
pub use text::PlainTextExtractor;
