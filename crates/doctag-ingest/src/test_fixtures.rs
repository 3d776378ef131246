//! In-memory collaborator implementations for pipeline testing.
//!
//! Deterministic stand-ins for the metadata store, tag vocabulary, and
//! blob store, with failure toggles for exercising the pipeline's
//! degradation policy without a database or filesystem.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use doctag_core::{
    BlobStore, CreateDocumentRequest, Document, DocumentRepository, Error, Result, Tag, TagStore,
    TextExtractor,
};

/// In-memory [`DocumentRepository`].
#[derive(Default)]
pub struct MemDocumentRepository {
    rows: Mutex<HashMap<Uuid, Document>>,
    fail_insert: AtomicBool,
}

impl MemDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent inserts fail.
    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentRepository for MemDocumentRepository {
    async fn insert(&self, req: CreateDocumentRequest) -> Result<Document> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Storage("metadata store unavailable".into()));
        }

        let now = Utc::now();
        let document = Document {
            id: Uuid::now_v7(),
            owner_id: req.owner_id,
            original_filename: req.original_filename,
            content_type: req.content_type,
            size_bytes: req.size_bytes,
            storage_path: req.storage_path,
            created_at: now,
            updated_at: now,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn fetch_for_owner(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        match self.rows.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::DocumentNotFound(id)),
        }
    }
}

/// In-memory [`TagStore`] with a name-uniqueness invariant.
#[derive(Default)]
pub struct MemTagStore {
    tags: Mutex<HashMap<String, Tag>>,
    links: Mutex<HashSet<(Uuid, Uuid)>>,
    fail_insert: AtomicBool,
    fail_link: AtomicBool,
}

impl MemTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `insert_many` calls fail.
    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `link_to_document` calls fail.
    pub fn set_fail_link(&self, fail: bool) {
        self.fail_link.store(fail, Ordering::SeqCst);
    }

    /// Number of distinct tag rows in the vocabulary.
    pub fn tag_count(&self) -> usize {
        self.tags.lock().unwrap().len()
    }

    /// Number of document-tag link rows.
    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl TagStore for MemTagStore {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>> {
        let tags = self.tags.lock().unwrap();
        Ok(names.iter().filter_map(|n| tags.get(n).cloned()).collect())
    }

    async fn insert_many(&self, names: &[String]) -> Result<Vec<Tag>> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Storage("tag store unavailable".into()));
        }

        let mut tags = self.tags.lock().unwrap();
        for name in names {
            if tags.contains_key(name) {
                return Err(Error::Conflict(format!("duplicate tag name: {}", name)));
            }
        }
        Ok(names
            .iter()
            .map(|name| {
                let tag = Tag {
                    id: Uuid::now_v7(),
                    name: name.clone(),
                    created_at: Utc::now(),
                };
                tags.insert(name.clone(), tag.clone());
                tag
            })
            .collect())
    }

    async fn link_to_document(&self, document_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        if self.fail_link.load(Ordering::SeqCst) {
            return Err(Error::Storage("link table unavailable".into()));
        }

        let mut links = self.links.lock().unwrap();
        for tag_id in tag_ids {
            links.insert((document_id, *tag_id));
        }
        Ok(())
    }

    async fn tags_for_document(&self, document_id: Uuid) -> Result<Vec<Tag>> {
        let links = self.links.lock().unwrap();
        let tags = self.tags.lock().unwrap();
        let mut found: Vec<Tag> = tags
            .values()
            .filter(|t| links.contains(&(document_id, t.id)))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn tags_for_documents(
        &self,
        document_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tag>>> {
        let mut map = HashMap::new();
        for &document_id in document_ids {
            let tags = self.tags_for_document(document_id).await?;
            if !tags.is_empty() {
                map.insert(document_id, tags);
            }
        }
        Ok(map)
    }
}

/// In-memory [`BlobStore`].
#[derive(Default)]
pub struct MemBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_put: AtomicBool,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail.
    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn put(&self, path: &str, data: &[u8], _content_type: &str) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::Storage("blob store unavailable".into()));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

/// [`TextExtractor`] that always fails, for degradation tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTextExtractor;

#[async_trait]
impl TextExtractor for FailingTextExtractor {
    async fn extract(&self, _data: &[u8], _content_type: &str) -> Result<Option<String>> {
        Err(Error::Extraction("simulated extractor crash".into()))
    }
}
