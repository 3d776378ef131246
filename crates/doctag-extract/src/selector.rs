//! Corpus-size strategy selection between semantic and statistical
//! extraction.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use doctag_core::{
    defaults::{COLD_START_THRESHOLD, KEYWORD_COUNT},
    ExtractionMethod, ExtractionOutcome, Result, SearchIndex,
};

use crate::semantic::SemanticExtractor;
use crate::tfidf::TfidfExtractor;

/// Normalize a ranked keyword list: trim, lowercase, drop empties, and
/// collapse duplicates while preserving rank order.
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Keyword extractor that picks a strategy from the current corpus size.
///
/// Below the cold-start threshold the corpus cannot establish term rarity,
/// so extraction runs semantically against the document's own text. At or
/// above the threshold extraction is statistical. The two paths never fall
/// back to each other: a failing strategy surfaces its error rather than
/// silently producing keywords of a different character.
pub struct HybridExtractor {
    index: Arc<dyn SearchIndex>,
    semantic: SemanticExtractor,
    statistical: TfidfExtractor,
    cold_start_threshold: i64,
}

impl HybridExtractor {
    pub fn new(index: Arc<dyn SearchIndex>, semantic: SemanticExtractor) -> Self {
        let statistical = TfidfExtractor::new(index.clone(), KEYWORD_COUNT);
        Self {
            index,
            semantic,
            statistical,
            cold_start_threshold: COLD_START_THRESHOLD,
        }
    }

    /// Override the corpus-size threshold for switching strategies.
    pub fn with_cold_start_threshold(mut self, threshold: i64) -> Self {
        self.cold_start_threshold = threshold;
        self
    }

    /// Override how many keywords the statistical strategy returns.
    pub fn with_keyword_count(mut self, top_k: usize) -> Self {
        self.statistical = TfidfExtractor::new(self.index.clone(), top_k);
        self
    }

    /// Extract keywords for an indexed document.
    ///
    /// `text` is the document's extracted text, used only by the semantic
    /// path; the statistical path reads term statistics from the index.
    pub async fn extract(&self, document_id: Uuid, text: &str) -> Result<ExtractionOutcome> {
        let corpus_size = self.index.document_count().await?;

        let (keywords, method) = if corpus_size < self.cold_start_threshold {
            (
                self.semantic.extract(text).await?,
                ExtractionMethod::Semantic,
            )
        } else {
            (
                self.statistical.extract(document_id).await?,
                ExtractionMethod::Statistical,
            )
        };

        let keywords = normalize_keywords(keywords);
        info!(
            subsystem = "extract",
            component = "hybrid",
            op = "extract",
            document_id = %document_id,
            corpus_size,
            method = %method,
            keyword_count = keywords.len(),
            "Keyword extraction complete"
        );
        Ok(ExtractionOutcome { keywords, method })
    }
}
