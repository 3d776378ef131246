//! Deterministic in-memory search index.
//!
//! Tokenizes content itself (lowercase, alphanumeric word splitting) and
//! derives document frequencies across everything indexed so far, which
//! makes it a faithful stand-in for the statistical extraction strategy in
//! tests and single-process deployments. Failure toggles simulate an
//! unavailable index for pipeline degradation tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use doctag_core::{Error, IndexFields, Result, SearchIndex, TermStatistics, TermStats};

/// Split text into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// In-memory implementation of [`SearchIndex`].
#[derive(Default)]
pub struct MemoryIndex {
    /// Per-document term frequencies.
    docs: Mutex<HashMap<Uuid, HashMap<String, i64>>>,
    fail_indexing: AtomicBool,
    fail_statistics: AtomicBool,
    fail_count: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the index with `n` synthetic documents, for driving the
    /// hybrid selector's corpus-size decision in tests.
    pub fn with_seeded_documents(self, n: usize) -> Self {
        {
            let mut docs = self.docs.lock().unwrap();
            for i in 0..n {
                let mut terms = HashMap::new();
                terms.insert(format!("seed{i}"), 1);
                terms.insert("filler".to_string(), 1);
                docs.insert(Uuid::new_v4(), terms);
            }
        }
        self
    }

    /// Make subsequent `index_document` calls fail.
    pub fn set_fail_indexing(&self, fail: bool) {
        self.fail_indexing.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `term_statistics` calls fail.
    pub fn set_fail_statistics(&self, fail: bool) {
        self.fail_statistics.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `document_count` calls fail.
    pub fn set_fail_count(&self, fail: bool) {
        self.fail_count.store(fail, Ordering::SeqCst);
    }

    /// Number of documents currently indexed.
    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_document(&self, fields: &IndexFields) -> Result<()> {
        if self.fail_indexing.load(Ordering::SeqCst) {
            return Err(Error::Search("index unavailable".into()));
        }

        let mut term_freqs: HashMap<String, i64> = HashMap::new();
        for term in tokenize(&fields.content) {
            *term_freqs.entry(term).or_insert(0) += 1;
        }

        self.docs
            .lock()
            .unwrap()
            .insert(fields.document_id, term_freqs);
        Ok(())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<()> {
        if self.fail_indexing.load(Ordering::SeqCst) {
            return Err(Error::Search("index unavailable".into()));
        }
        self.docs.lock().unwrap().remove(&document_id);
        Ok(())
    }

    async fn document_count(&self) -> Result<i64> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(Error::Search("count unavailable".into()));
        }
        Ok(self.docs.lock().unwrap().len() as i64)
    }

    async fn term_statistics(&self, document_id: Uuid) -> Result<Option<TermStatistics>> {
        if self.fail_statistics.load(Ordering::SeqCst) {
            return Err(Error::Search("term vectors unavailable".into()));
        }

        let docs = self.docs.lock().unwrap();
        let Some(term_freqs) = docs.get(&document_id) else {
            return Ok(None);
        };

        let doc_count = docs.len() as i64;
        let terms = term_freqs
            .iter()
            .map(|(term, &tf)| {
                let df = docs.values().filter(|d| d.contains_key(term)).count() as i64;
                (
                    term.clone(),
                    TermStats {
                        term_freq: tf,
                        doc_freq: df,
                    },
                )
            })
            .collect();

        Ok(Some(TermStatistics { terms, doc_count }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fields(document_id: Uuid, content: &str) -> IndexFields {
        IndexFields {
            document_id,
            owner_id: Uuid::new_v4(),
            content: content.to_string(),
            filename: "test.txt".to_string(),
            content_type: "text/plain".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Rust, the Tokio runtime!"),
            vec!["rust", "the", "tokio", "runtime"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[tokio::test]
    async fn test_index_and_count() {
        let index = MemoryIndex::new();
        assert_eq!(index.document_count().await.unwrap(), 0);

        index
            .index_document(&fields(Uuid::new_v4(), "hello world"))
            .await
            .unwrap();
        assert_eq!(index.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_term_statistics_computes_df_across_corpus() {
        let index = MemoryIndex::new();
        let target = Uuid::new_v4();

        index
            .index_document(&fields(target, "rust rust async"))
            .await
            .unwrap();
        index
            .index_document(&fields(Uuid::new_v4(), "rust database"))
            .await
            .unwrap();

        let stats = index.term_statistics(target).await.unwrap().unwrap();
        assert_eq!(stats.doc_count, 2);
        assert_eq!(stats.terms["rust"].term_freq, 2);
        assert_eq!(stats.terms["rust"].doc_freq, 2);
        assert_eq!(stats.terms["async"].doc_freq, 1);
    }

    #[tokio::test]
    async fn test_statistics_absent_for_unindexed_document() {
        let index = MemoryIndex::new();
        let stats = index.term_statistics(Uuid::new_v4()).await.unwrap();
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn test_empty_content_indexes_with_no_terms() {
        let index = MemoryIndex::new();
        let id = Uuid::new_v4();
        index.index_document(&fields(id, "")).await.unwrap();

        let stats = index.term_statistics(id).await.unwrap().unwrap();
        assert!(stats.is_empty());
        assert_eq!(stats.doc_count, 1);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let index = MemoryIndex::new();
        index.set_fail_indexing(true);
        let err = index
            .index_document(&fields(Uuid::new_v4(), "content"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Search(_)));

        index.set_fail_count(true);
        assert!(matches!(
            index.document_count().await,
            Err(Error::Search(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_documents_drive_count() {
        let index = MemoryIndex::new().with_seeded_documents(12);
        assert_eq!(index.document_count().await.unwrap(), 12);
    }
}
