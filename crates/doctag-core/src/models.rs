//! Core data models for doctag.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingested document, owned by exactly one user.
///
/// `id` and `owner_id` are immutable after creation; `storage_path` is
/// unique across all documents and owned by the blob-store collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A canonical, case-normalized keyword shared across documents.
///
/// Tags are vocabulary entries: created lazily on first use, never deleted
/// when a document that references them is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Association row between one document and one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTag {
    pub document_id: Uuid,
    pub tag_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A document together with its attached tags, for list/detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWithTags {
    pub document: Document,
    pub tags: Vec<Tag>,
}

/// Which extraction strategy produced a keyword set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Embedding-similarity ranking over candidate phrases (cold start).
    Semantic,
    /// TF-IDF ranking over indexed term statistics.
    Statistical,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Semantic => "semantic",
            ExtractionMethod::Statistical => "statistical",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered keywords plus the strategy that produced them.
///
/// Transient pipeline output; reported to the caller for provenance but
/// never persisted as its own entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub keywords: Vec<String>,
    pub method: ExtractionMethod,
}

/// Result of a completed ingestion.
///
/// `tags` may legitimately be empty and `extraction_method` absent when an
/// enrichment stage degraded; the document itself is always durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document: Document,
    pub tags: Vec<Tag>,
    pub extraction_method: Option<ExtractionMethod>,
}

/// Per-term statistics for a single indexed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// Occurrences of the term within this document.
    pub term_freq: i64,
    /// Number of corpus documents containing the term.
    pub doc_freq: i64,
}

/// Term statistics for one document plus the corpus size they were
/// computed against, as reported by the search-index collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermStatistics {
    pub terms: HashMap<String, TermStats>,
    /// Total number of documents in the index at statistics time.
    pub doc_count: i64,
}

impl TermStatistics {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Fields sent to the search index for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFields {
    pub document_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub filename: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}
