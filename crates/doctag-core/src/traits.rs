//! Core traits for doctag collaborator abstractions.
//!
//! These traits define the seams between the ingestion pipeline and its
//! external collaborators (metadata store, tag vocabulary, blob storage,
//! text extraction, search index, embedding scorer), enabling pluggable
//! backends and testability.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Request for creating a new document row.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub owner_id: Uuid,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
}

/// Repository for document metadata CRUD.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document and read back the stored row
    /// (server-assigned id and timestamps included).
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Document>;

    /// Fetch a document by id, scoped to its owner.
    async fn fetch_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>>;

    /// List all documents for an owner, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>>;

    /// Delete a document row. Tag links cascade; shared tag rows survive.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// TAG VOCABULARY STORE
// =============================================================================

/// Durable name→tag vocabulary with a uniqueness constraint on name.
///
/// The uniqueness constraint is the sole concurrency-safety mechanism:
/// `insert_many` must report a concurrent duplicate insert as
/// `Error::Conflict` so the reconciler can re-read instead of failing.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Bulk lookup of tags by normalized name.
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Bulk insert of new tags. Names must already be normalized.
    ///
    /// Returns `Error::Conflict` if any name was created concurrently.
    /// The write is all-or-nothing: on conflict, nothing from this call
    /// was inserted, and the caller re-reads and retries the remainder.
    async fn insert_many(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Link tags to a document in one write. Re-linking an existing
    /// (document, tag) pair is a no-op.
    async fn link_to_document(&self, document_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;

    /// All tags currently linked to a document.
    async fn tags_for_document(&self, document_id: Uuid) -> Result<Vec<Tag>>;

    /// Tags for many documents in one query, keyed by document id.
    /// Documents with no tags are absent from the map.
    async fn tags_for_documents(
        &self,
        document_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tag>>>;
}

// =============================================================================
// BLOB STORAGE
// =============================================================================

/// Raw-byte storage collaborator. Paths are opaque, caller-generated,
/// and collision-free.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write data under the given path.
    async fn put(&self, path: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Delete data at the given path. Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

/// Byte-to-text extraction collaborator.
///
/// `Ok(None)` means the format is unsupported or yielded no text, which is
/// a normal outcome for the pipeline, not an error.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: &[u8], content_type: &str) -> Result<Option<String>>;
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Search-index collaborator: indexing plus the corpus statistics the
/// statistical extraction strategy depends on.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index (or re-index) one document's fields.
    async fn index_document(&self, fields: &IndexFields) -> Result<()>;

    /// Remove a document from the index. Best-effort on delete paths.
    async fn delete_document(&self, document_id: Uuid) -> Result<()>;

    /// Total number of currently indexed documents.
    async fn document_count(&self) -> Result<i64>;

    /// Per-term statistics for a previously indexed document, or `None`
    /// if the document is not in the index.
    async fn term_statistics(&self, document_id: Uuid) -> Result<Option<TermStatistics>>;
}

// =============================================================================
// EMBEDDING / SEMANTIC SCORING
// =============================================================================

/// Embedding model collaborator.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding vector for one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Semantic keyword scorer: raw text in, ranked candidate keyphrases out.
#[async_trait]
pub trait KeywordScorer: Send + Sync {
    /// Score candidate phrases for the given text, best first.
    async fn score_candidates(&self, text: &str) -> Result<Vec<(String, f32)>>;
}
