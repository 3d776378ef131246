//! # doctag-extract
//!
//! Hybrid keyword extraction for doctag.
//!
//! Two strategies live behind one selector:
//! - [`TfidfExtractor`]: statistical ranking over the search index's term
//!   statistics; meaningful once the corpus is large enough for document
//!   frequency to establish rarity.
//! - [`SemanticExtractor`]: embedding-similarity ranking over candidate
//!   phrases; the cold-start path when the corpus is too small.
//!
//! [`HybridExtractor`] picks between them from the current corpus size and
//! never silently falls back from one to the other: the strategies have
//! different cost profiles and a fallback would mask real failures.

pub mod embedding;
pub mod mock;
pub mod selector;
pub mod semantic;
pub mod tfidf;

pub use embedding::HttpEmbeddingBackend;
pub use mock::MockEmbeddingBackend;
pub use selector::HybridExtractor;
pub use semantic::{EmbeddingKeywordScorer, SemanticExtractor};
pub use tfidf::TfidfExtractor;
