//! TF-IDF extraction strategy over indexed term statistics.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use doctag_core::{
    defaults::{TERM_MAX_CHARS, TERM_MIN_CHARS},
    Result, SearchIndex, TermStatistics,
};

/// Score every in-bounds term of a statistics map.
///
/// `idf(t) = ln((N + 1) / (df(t) + 1)) + 1`, `score(t) = tf(t) * idf(t)`.
/// Terms outside `[TERM_MIN_CHARS, TERM_MAX_CHARS]` characters are index
/// artifacts and are dropped before scoring. Output is sorted by score
/// descending with ties broken by term ascending, so the ranking is
/// reproducible for the same input.
pub fn score_terms(stats: &TermStatistics) -> Vec<(String, f64)> {
    let n = stats.doc_count;
    let mut scored: Vec<(String, f64)> = stats
        .terms
        .iter()
        .filter(|(term, _)| {
            let len = term.chars().count();
            (TERM_MIN_CHARS..=TERM_MAX_CHARS).contains(&len)
        })
        .map(|(term, s)| {
            let idf = ((n + 1) as f64 / (s.doc_freq + 1) as f64).ln() + 1.0;
            (term.clone(), s.term_freq as f64 * idf)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored
}

/// Statistical extraction strategy backed by a [`SearchIndex`].
pub struct TfidfExtractor {
    index: Arc<dyn SearchIndex>,
    top_k: usize,
}

impl TfidfExtractor {
    pub fn new(index: Arc<dyn SearchIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// Extract the `top_k` highest-scoring terms for an indexed document.
    ///
    /// A document with no term statistics (not indexed with any text)
    /// yields an empty sequence; that is a valid outcome, not an error.
    pub async fn extract(&self, document_id: Uuid) -> Result<Vec<String>> {
        let Some(stats) = self.index.term_statistics(document_id).await? else {
            debug!(
                subsystem = "extract",
                component = "tfidf",
                op = "extract",
                document_id = %document_id,
                "No term statistics for document"
            );
            return Ok(Vec::new());
        };

        let keywords: Vec<String> = score_terms(&stats)
            .into_iter()
            .take(self.top_k)
            .map(|(term, _)| term)
            .collect();

        debug!(
            subsystem = "extract",
            component = "tfidf",
            op = "extract",
            document_id = %document_id,
            corpus_size = stats.doc_count,
            keyword_count = keywords.len(),
            "TF-IDF extraction complete"
        );
        Ok(keywords)
    }
}
