//! Elasticsearch-compatible HTTP search index backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use doctag_core::{
    defaults, Error, IndexFields, Result, SearchIndex, TermStatistics, TermStats,
};

/// Default search-index endpoint.
pub const DEFAULT_SEARCH_URL: &str = defaults::SEARCH_URL;

/// Default index name.
pub const DEFAULT_INDEX_NAME: &str = defaults::SEARCH_INDEX_NAME;

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct TermVectorsResponse {
    #[serde(default)]
    term_vectors: HashMap<String, FieldTermVectors>,
}

#[derive(Debug, Deserialize)]
struct FieldTermVectors {
    field_statistics: FieldStatistics,
    #[serde(default)]
    terms: HashMap<String, TermInfo>,
}

#[derive(Debug, Deserialize)]
struct FieldStatistics {
    doc_count: i64,
}

#[derive(Debug, Deserialize)]
struct TermInfo {
    #[serde(default = "one")]
    term_freq: i64,
    #[serde(default = "one")]
    doc_freq: i64,
}

fn one() -> i64 {
    1
}

/// HTTP search index backend speaking the Elasticsearch document and
/// term-vectors APIs.
pub struct HttpSearchIndex {
    client: Client,
    base_url: String,
    index_name: String,
}

impl HttpSearchIndex {
    /// Create a new backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_SEARCH_URL.to_string(),
            DEFAULT_INDEX_NAME.to_string(),
        )
    }

    /// Create a new backend with custom endpoint and index name.
    pub fn with_config(base_url: String, index_name: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::SEARCH_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "search",
            component = "http_index",
            op = "init",
            url = %base_url,
            index = %index_name,
            "Initializing search index backend"
        );

        Self {
            client,
            base_url,
            index_name,
        }
    }

    /// Create from environment variables.
    ///
    /// `DOCTAG_SEARCH_URL` and `DOCTAG_SEARCH_INDEX` override the defaults.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("DOCTAG_SEARCH_URL").unwrap_or_else(|_| DEFAULT_SEARCH_URL.to_string());
        let index_name = std::env::var("DOCTAG_SEARCH_INDEX")
            .unwrap_or_else(|_| DEFAULT_INDEX_NAME.to_string());
        Self::with_config(base_url, index_name)
    }

    fn doc_url(&self, document_id: Uuid) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index_name, document_id)
    }
}

impl Default for HttpSearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn index_document(&self, fields: &IndexFields) -> Result<()> {
        let body = serde_json::json!({
            "document_id": fields.document_id,
            "owner_id": fields.owner_id,
            "content": fields.content,
            "filename": fields.filename,
            "content_type": fields.content_type,
            "uploaded_at": fields.uploaded_at,
        });

        let response = self
            .client
            .put(self.doc_url(fields.document_id))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Search(format!(
                "index write failed with status {}",
                response.status()
            )));
        }

        debug!(
            subsystem = "search",
            component = "http_index",
            op = "index_document",
            document_id = %fields.document_id,
            content_len = fields.content.len(),
            "Document indexed"
        );
        Ok(())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<()> {
        let response = self.client.delete(self.doc_url(document_id)).send().await?;

        // Deleting a document that was never indexed is a no-op.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(Error::Search(format!(
                "index delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn document_count(&self) -> Result<i64> {
        let url = format!("{}/{}/_count", self.base_url, self.index_name);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Search(format!(
                "count query failed with status {}",
                response.status()
            )));
        }

        let parsed: CountResponse = response.json().await?;
        Ok(parsed.count)
    }

    async fn term_statistics(&self, document_id: Uuid) -> Result<Option<TermStatistics>> {
        let url = format!(
            "{}/{}/_termvectors/{}",
            self.base_url, self.index_name, document_id
        );
        let body = serde_json::json!({
            "fields": ["content"],
            "term_statistics": true,
            "field_statistics": true,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Search(format!(
                "term vectors query failed with status {}",
                response.status()
            )));
        }

        let parsed: TermVectorsResponse = response.json().await?;
        // A document with no extractable text has no term vectors; that is
        // empty statistics, not an error.
        let Some(field) = parsed.term_vectors.get("content") else {
            return Ok(Some(TermStatistics::default()));
        };

        let terms = field
            .terms
            .iter()
            .map(|(term, info)| {
                (
                    term.clone(),
                    TermStats {
                        term_freq: info.term_freq,
                        doc_freq: info.doc_freq,
                    },
                )
            })
            .collect();

        Ok(Some(TermStatistics {
            terms,
            doc_count: field.field_statistics.doc_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_vectors_response_parsing() {
        let json = r#"{
            "term_vectors": {
                "content": {
                    "field_statistics": { "doc_count": 12, "sum_doc_freq": 99, "sum_ttf": 120 },
                    "terms": {
                        "rust": { "term_freq": 4, "doc_freq": 2 },
                        "tokio": { "term_freq": 1, "doc_freq": 1 }
                    }
                }
            }
        }"#;

        let parsed: TermVectorsResponse = serde_json::from_str(json).unwrap();
        let field = parsed.term_vectors.get("content").unwrap();
        assert_eq!(field.field_statistics.doc_count, 12);
        assert_eq!(field.terms["rust"].term_freq, 4);
        assert_eq!(field.terms["rust"].doc_freq, 2);
        assert_eq!(field.terms["tokio"].doc_freq, 1);
    }

    #[test]
    fn test_term_vectors_response_without_vectors() {
        let parsed: TermVectorsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.term_vectors.is_empty());
    }

    #[test]
    fn test_count_response_parsing() {
        let parsed: CountResponse =
            serde_json::from_str(r#"{"count": 42, "_shards": {}}"#).unwrap();
        assert_eq!(parsed.count, 42);
    }

    #[test]
    fn test_doc_url_shape() {
        let index = HttpSearchIndex::with_config(
            "http://localhost:9200".to_string(),
            "documents".to_string(),
        );
        let id = Uuid::nil();
        assert_eq!(
            index.doc_url(id),
            format!("http://localhost:9200/documents/_doc/{}", id)
        );
    }
}
