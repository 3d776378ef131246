//! Ingestion orchestrator.
//!
//! One [`IngestService`] instance drives every upload through the same
//! sequence: validate, store blob, persist metadata, extract text, index,
//! extract keywords, reconcile and link tags. The metadata persist is the
//! durability point. Failures before it surface to the caller with no
//! partial state to clean up (an orphaned blob after a failed persist is
//! reconciled out-of-band). Failures after it degrade the receipt's
//! enrichment fields and never roll the document back.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use doctag_core::{
    validate_upload, BlobStore, CreateDocumentRequest, DocumentRepository, DocumentWithTags,
    Error, IndexFields, IngestConfig, IngestReceipt, Result, SearchIndex, Tag, TagReconciler,
    TagStore, TextExtractor,
};
use doctag_db::blob::generate_storage_path;
use doctag_extract::HybridExtractor;

/// Orchestrates the document ingestion pipeline.
pub struct IngestService {
    documents: Arc<dyn DocumentRepository>,
    tags: Arc<dyn TagStore>,
    blobs: Arc<dyn BlobStore>,
    text: Arc<dyn TextExtractor>,
    index: Arc<dyn SearchIndex>,
    keywords: HybridExtractor,
    reconciler: TagReconciler,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        tags: Arc<dyn TagStore>,
        blobs: Arc<dyn BlobStore>,
        text: Arc<dyn TextExtractor>,
        index: Arc<dyn SearchIndex>,
        keywords: HybridExtractor,
        config: IngestConfig,
    ) -> Self {
        let reconciler = TagReconciler::new(tags.clone());
        Self {
            documents,
            tags,
            blobs,
            text,
            index,
            keywords,
            reconciler,
            config,
        }
    }

    /// Ingest one upload end to end.
    ///
    /// Returns the durable document plus whatever enrichment succeeded: the
    /// tag list and extraction method are legitimately empty/absent when an
    /// enrichment stage degraded.
    pub async fn ingest(
        &self,
        owner_id: Uuid,
        original_filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<IngestReceipt> {
        let start = Instant::now();

        validate_upload(
            original_filename,
            content_type,
            data,
            self.config.max_file_size_bytes,
        )?;

        let storage_path = generate_storage_path(owner_id, original_filename);
        self.blobs.put(&storage_path, data, content_type).await?;

        let document = self
            .documents
            .insert(CreateDocumentRequest {
                owner_id,
                original_filename: original_filename.to_string(),
                content_type: content_type.to_string(),
                size_bytes: data.len() as i64,
                storage_path,
            })
            .await?;

        // Durability point. From here on, degrade instead of failing.
        let text = match self.text.extract(data, content_type).await {
            Ok(extracted) => extracted.unwrap_or_default(),
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    component = "pipeline",
                    stage = "extract_text",
                    document_id = %document.id,
                    error = %e,
                    "Text extraction failed; continuing with empty text"
                );
                String::new()
            }
        };

        let fields = IndexFields {
            document_id: document.id,
            owner_id,
            content: text.clone(),
            filename: document.original_filename.clone(),
            content_type: document.content_type.clone(),
            uploaded_at: document.created_at,
        };
        if let Err(e) = self.index.index_document(&fields).await {
            // Both extraction strategies only run post-index (the statistical
            // one reads the index, and method provenance has to mean the same
            // thing for both), so an index failure skips keywords outright.
            warn!(
                subsystem = "ingest",
                component = "pipeline",
                stage = "index",
                document_id = %document.id,
                error = %e,
                "Indexing failed; document stored without keywords"
            );
            return Ok(IngestReceipt {
                document,
                tags: Vec::new(),
                extraction_method: None,
            });
        }

        // No extractable text means nothing to score. The document is
        // complete, just untagged.
        if text.trim().is_empty() {
            info!(
                subsystem = "ingest",
                component = "pipeline",
                op = "ingest",
                document_id = %document.id,
                owner_id = %owner_id,
                duration_ms = start.elapsed().as_millis() as u64,
                tag_count = 0,
                "Ingestion complete (no extractable text)"
            );
            return Ok(IngestReceipt {
                document,
                tags: Vec::new(),
                extraction_method: None,
            });
        }

        let outcome = match self.keywords.extract(document.id, &text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    component = "pipeline",
                    stage = "extract_keywords",
                    document_id = %document.id,
                    error = %e,
                    "Keyword extraction failed; document stored without tags"
                );
                return Ok(IngestReceipt {
                    document,
                    tags: Vec::new(),
                    extraction_method: None,
                });
            }
        };

        let tags = match self.attach_tags(document.id, &outcome.keywords).await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    component = "pipeline",
                    stage = "tag",
                    document_id = %document.id,
                    error = %e,
                    "Tag reconciliation or linking failed; document stored untagged"
                );
                Vec::new()
            }
        };

        info!(
            subsystem = "ingest",
            component = "pipeline",
            op = "ingest",
            document_id = %document.id,
            owner_id = %owner_id,
            duration_ms = start.elapsed().as_millis() as u64,
            tag_count = tags.len(),
            method = %outcome.method,
            "Ingestion complete"
        );
        Ok(IngestReceipt {
            document,
            tags,
            extraction_method: Some(outcome.method),
        })
    }

    async fn attach_tags(&self, document_id: Uuid, keywords: &[String]) -> Result<Vec<Tag>> {
        let tags = self.reconciler.reconcile(keywords).await?;
        if tags.is_empty() {
            return Ok(tags);
        }
        let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
        self.tags.link_to_document(document_id, &tag_ids).await?;
        Ok(tags)
    }

    /// Delete a document, its blob, its index entry, and (by cascade) its
    /// tag links. Shared tag rows survive.
    pub async fn delete(&self, document_id: Uuid, owner_id: Uuid) -> Result<()> {
        let document = self
            .documents
            .fetch_for_owner(document_id, owner_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))?;

        self.blobs.delete(&document.storage_path).await?;

        // The search index is an enhancement on delete too: a stale index
        // entry is tolerable, a stale document row is not.
        if let Err(e) = self.index.delete_document(document.id).await {
            warn!(
                subsystem = "ingest",
                component = "pipeline",
                op = "delete",
                document_id = %document.id,
                error = %e,
                "Index delete failed; removing document anyway"
            );
        }

        self.documents.delete(document.id).await?;
        info!(
            subsystem = "ingest",
            component = "pipeline",
            op = "delete",
            document_id = %document.id,
            owner_id = %owner_id,
            "Document deleted"
        );
        Ok(())
    }

    /// Fetch one document with its tags, scoped to its owner.
    pub async fn get_document(
        &self,
        document_id: Uuid,
        owner_id: Uuid,
    ) -> Result<DocumentWithTags> {
        let document = self
            .documents
            .fetch_for_owner(document_id, owner_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))?;
        let tags = self.tags.tags_for_document(document.id).await?;
        Ok(DocumentWithTags { document, tags })
    }

    /// List an owner's documents, newest first, with tags attached in one
    /// batched lookup.
    pub async fn list_documents(&self, owner_id: Uuid) -> Result<Vec<DocumentWithTags>> {
        let documents = self.documents.list_for_owner(owner_id).await?;
        let ids: Vec<Uuid> = documents.iter().map(|d| d.id).collect();
        let mut tag_map = self.tags.tags_for_documents(&ids).await?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let tags = tag_map.remove(&document.id).unwrap_or_default();
                DocumentWithTags { document, tags }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        FailingTextExtractor, MemBlobStore, MemDocumentRepository, MemTagStore,
    };
    use doctag_core::ExtractionMethod;
    use crate::text::PlainTextExtractor;
    use doctag_extract::{EmbeddingKeywordScorer, MockEmbeddingBackend, SemanticExtractor};
    use doctag_search::MemoryIndex;

    struct Harness {
        documents: Arc<MemDocumentRepository>,
        tags: Arc<MemTagStore>,
        blobs: Arc<MemBlobStore>,
        index: Arc<MemoryIndex>,
        service: IngestService,
    }

    fn harness_with(index: MemoryIndex, text: Arc<dyn TextExtractor>) -> Harness {
        let documents = Arc::new(MemDocumentRepository::new());
        let tags = Arc::new(MemTagStore::new());
        let blobs = Arc::new(MemBlobStore::new());
        let index = Arc::new(index);
        let config = IngestConfig::default();

        let backend = Arc::new(MockEmbeddingBackend::new().with_dimension(64));
        let scorer = Arc::new(EmbeddingKeywordScorer::new(backend));
        let semantic = SemanticExtractor::new(scorer, config.keyword_count);
        let keywords = HybridExtractor::new(index.clone(), semantic)
            .with_keyword_count(config.keyword_count)
            .with_cold_start_threshold(config.cold_start_threshold);

        let service = IngestService::new(
            documents.clone(),
            tags.clone(),
            blobs.clone(),
            text,
            index.clone(),
            keywords,
            config,
        );
        Harness {
            documents,
            tags,
            blobs,
            index,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryIndex::new(), Arc::new(PlainTextExtractor::new()))
    }

    #[tokio::test]
    async fn test_ingest_happy_path_cold_start() {
        let h = harness();
        let owner = Uuid::new_v4();

        let receipt = h
            .service
            .ingest(
                owner,
                "notes.txt",
                "text/plain",
                b"tokio runtime scheduling internals",
            )
            .await
            .unwrap();

        assert_eq!(receipt.document.owner_id, owner);
        assert_eq!(receipt.extraction_method, Some(ExtractionMethod::Semantic));
        assert!(!receipt.tags.is_empty());
        assert_eq!(h.documents.len(), 1);
        assert_eq!(h.blobs.len(), 1);
        assert!(h.blobs.contains(&receipt.document.storage_path));
        assert_eq!(h.index.len(), 1);

        // Linked tags match the receipt.
        let with_tags = h
            .service
            .get_document(receipt.document.id, owner)
            .await
            .unwrap();
        assert_eq!(with_tags.tags.len(), receipt.tags.len());
    }

    #[tokio::test]
    async fn test_ingest_large_corpus_uses_statistical() {
        let h = harness_with(
            MemoryIndex::new().with_seeded_documents(12),
            Arc::new(PlainTextExtractor::new()),
        );

        let receipt = h
            .service
            .ingest(
                Uuid::new_v4(),
                "doc.txt",
                "text/plain",
                b"zymurgy zymurgy fermentation vessels",
            )
            .await
            .unwrap();

        assert_eq!(
            receipt.extraction_method,
            Some(ExtractionMethod::Statistical)
        );
        let names: Vec<&str> = receipt.tags.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"zymurgy"));
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_no_state() {
        let h = harness();

        let err = h
            .service
            .ingest(Uuid::new_v4(), "empty.txt", "text/plain", b"")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(h.documents.is_empty());
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_disallowed_content_type_rejected() {
        let h = harness();
        let err = h
            .service
            .ingest(Uuid::new_v4(), "a.bin", "application/octet-stream", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_blob_failure_is_terminal() {
        let h = harness();
        h.blobs.set_fail_put(true);

        let err = h
            .service
            .ingest(Uuid::new_v4(), "doc.txt", "text/plain", b"content")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_is_terminal() {
        let h = harness();
        h.documents.set_fail_insert(true);

        let err = h
            .service
            .ingest(Uuid::new_v4(), "doc.txt", "text/plain", b"content")
            .await
            .unwrap_err();

        // The orphaned blob is reconciled out-of-band; the operation itself
        // fails cleanly.
        assert!(matches!(err, Error::Storage(_)));
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_degrades_to_untagged_document() {
        let h = harness();
        h.index.set_fail_indexing(true);

        let receipt = h
            .service
            .ingest(Uuid::new_v4(), "doc.txt", "text/plain", b"searchable words")
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert!(receipt.extraction_method.is_none());
        assert_eq!(h.documents.len(), 1);
        assert_eq!(h.tags.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_text_extraction_failure_degrades_to_untagged_document() {
        let h = harness_with(MemoryIndex::new(), Arc::new(FailingTextExtractor));

        let receipt = h
            .service
            .ingest(Uuid::new_v4(), "doc.txt", "text/plain", b"unreachable")
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert!(receipt.extraction_method.is_none());
        // Document is still indexed, just with empty content.
        assert_eq!(h.index.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_ingests_without_tags() {
        let h = harness();
        // Valid PDF magic bytes, but PlainTextExtractor reports no text.
        let pdf = b"%PDF-1.7 minimal";

        let receipt = h
            .service
            .ingest(Uuid::new_v4(), "report.pdf", "application/pdf", pdf)
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert!(receipt.extraction_method.is_none());
        assert_eq!(h.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_only_text_completes_without_method() {
        let h = harness();

        let receipt = h
            .service
            .ingest(Uuid::new_v4(), "blank.txt", "text/plain", b"   \n\t  ")
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert!(receipt.extraction_method.is_none());
    }

    #[tokio::test]
    async fn test_keyword_extraction_failure_degrades() {
        let h = harness_with(
            MemoryIndex::new().with_seeded_documents(15),
            Arc::new(PlainTextExtractor::new()),
        );
        h.index.set_fail_statistics(true);

        let receipt = h
            .service
            .ingest(Uuid::new_v4(), "doc.txt", "text/plain", b"words here")
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert!(receipt.extraction_method.is_none());
        assert_eq!(h.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_link_failure_still_reports_success() {
        let h = harness();
        h.tags.set_fail_link(true);

        let receipt = h
            .service
            .ingest(
                Uuid::new_v4(),
                "doc.txt",
                "text/plain",
                b"kubernetes deployment rollout strategies",
            )
            .await
            .unwrap();

        assert!(receipt.tags.is_empty());
        assert_eq!(receipt.extraction_method, Some(ExtractionMethod::Semantic));
        assert_eq!(h.documents.len(), 1);
        assert_eq!(h.tags.link_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_links_keeps_shared_tags() {
        let h = harness();
        let owner = Uuid::new_v4();
        let content = b"distributed consensus protocols explained";

        let first = h
            .service
            .ingest(owner, "one.txt", "text/plain", content)
            .await
            .unwrap();
        let second = h
            .service
            .ingest(owner, "two.txt", "text/plain", content)
            .await
            .unwrap();
        assert!(!first.tags.is_empty());

        let tags_before = h.tags.tag_count();
        h.service.delete(first.document.id, owner).await.unwrap();

        // Tag rows are shared vocabulary; only links go.
        assert_eq!(h.tags.tag_count(), tags_before);
        assert_eq!(h.documents.len(), 1);
        assert!(!h.blobs.contains(&first.document.storage_path));

        let survivor = h
            .service
            .get_document(second.document.id, owner)
            .await
            .unwrap();
        assert_eq!(survivor.tags.len(), second.tags.len());
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let h = harness();
        let owner = Uuid::new_v4();

        let receipt = h
            .service
            .ingest(owner, "doc.txt", "text/plain", b"content here")
            .await
            .unwrap();

        let err = h
            .service
            .delete(receipt.document.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
        assert_eq!(h.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_tolerates_index_failure() {
        let h = harness();
        let owner = Uuid::new_v4();

        let receipt = h
            .service
            .ingest(owner, "doc.txt", "text/plain", b"some content")
            .await
            .unwrap();

        h.index.set_fail_indexing(true);
        h.service.delete(receipt.document.id, owner).await.unwrap();
        assert!(h.documents.is_empty());
    }

    #[tokio::test]
    async fn test_list_documents_with_tags_newest_first() {
        let h = harness();
        let owner = Uuid::new_v4();

        h.service
            .ingest(owner, "first.txt", "text/plain", b"graph databases overview")
            .await
            .unwrap();
        h.service
            .ingest(owner, "second.txt", "text/plain", b"   ")
            .await
            .unwrap();

        let listed = h.service.list_documents(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].document.original_filename, "second.txt");
        assert!(listed[0].tags.is_empty());
        assert!(!listed[1].tags.is_empty());

        // Another owner sees nothing.
        let other = h.service.list_documents(Uuid::new_v4()).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_ingest_reuses_vocabulary() {
        let h = harness();
        let owner = Uuid::new_v4();
        let content = b"erasure coding storage systems";

        let first = h
            .service
            .ingest(owner, "a.txt", "text/plain", content)
            .await
            .unwrap();
        let tags_after_first = h.tags.tag_count();

        let second = h
            .service
            .ingest(owner, "b.txt", "text/plain", content)
            .await
            .unwrap();

        // Same keywords, same tag rows: the vocabulary does not grow.
        assert_eq!(h.tags.tag_count(), tags_after_first);
        let mut first_ids: Vec<Uuid> = first.tags.iter().map(|t| t.id).collect();
        let mut second_ids: Vec<Uuid> = second.tags.iter().map(|t| t.id).collect();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids);
    }
}
