//! Semantic extraction strategy: embedding-similarity ranking over
//! candidate phrases with diversity-aware selection.
//!
//! The cold-start path: it needs no corpus at all, only the document's own
//! text and an embedding backend.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use doctag_core::{
    defaults::{MAX_SCORED_TEXT_CHARS, SEMANTIC_CANDIDATE_POOL, SEMANTIC_NGRAM_MAX},
    EmbeddingBackend, Error, KeywordScorer, Result,
};

/// Relevance/diversity trade-off for candidate re-ranking. Higher values
/// favor similarity to the document; lower values favor spread between
/// the selected phrases.
const DIVERSITY_LAMBDA: f32 = 0.7;

/// English stopwords filtered out of candidate phrases.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
        "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
        "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
        "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
        "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its",
        "itself", "just", "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off",
        "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same",
        "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
        "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
        "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
        "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    ]
    .into_iter()
    .collect()
});

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

fn tokenize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Generate 1..=`ngram_max`-token candidate phrases from text.
///
/// Unigrams must be non-stopwords of at least two characters; multi-token
/// phrases must not start or end with a stopword. Duplicates collapse,
/// first occurrence wins.
pub fn generate_candidates(text: &str, ngram_max: usize) -> Vec<String> {
    let words = tokenize_words(text);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for n in 1..=ngram_max {
        for window in words.windows(n) {
            let first = window.first().map(String::as_str).unwrap_or_default();
            let last = window.last().map(String::as_str).unwrap_or_default();
            if is_stopword(first) || is_stopword(last) {
                continue;
            }
            if n == 1 && first.chars().count() < 2 {
                continue;
            }
            let phrase = window.join(" ");
            if seen.insert(phrase.clone()) {
                candidates.push(phrase);
            }
        }
    }
    candidates
}

/// Cosine similarity between two vectors of equal dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a > 0.0 && mag_b > 0.0 {
        dot / (mag_a * mag_b)
    } else {
        0.0
    }
}

/// Re-rank candidates so near-duplicates do not dominate the front of
/// the list: each pick maximizes relevance minus similarity to what was
/// already picked (maximal marginal relevance).
fn diversify(candidates: Vec<(String, f32, Vec<f32>)>) -> Vec<(String, f32)> {
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::new();
    let mut ranked = Vec::new();

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (pos, &i) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[i].2, &candidates[s].2))
                .fold(0.0f32, f32::max);
            let score = DIVERSITY_LAMBDA * candidates[i].1 - (1.0 - DIVERSITY_LAMBDA) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        let best = remaining.swap_remove(best_pos);
        selected.push(best);
        ranked.push((candidates[best].0.clone(), candidates[best].1));
    }
    ranked
}

/// Keyword scorer that ranks candidate phrases by embedding similarity to
/// the document text, then applies diversity-aware re-ranking over an
/// oversampled candidate pool.
pub struct EmbeddingKeywordScorer {
    backend: Arc<dyn EmbeddingBackend>,
    candidate_pool: usize,
    ngram_max: usize,
}

impl EmbeddingKeywordScorer {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            candidate_pool: SEMANTIC_CANDIDATE_POOL,
            ngram_max: SEMANTIC_NGRAM_MAX,
        }
    }

    /// Override the oversampled candidate pool size.
    pub fn with_candidate_pool(mut self, n: usize) -> Self {
        self.candidate_pool = n;
        self
    }
}

#[async_trait]
impl KeywordScorer for EmbeddingKeywordScorer {
    async fn score_candidates(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let candidates = generate_candidates(text, self.ngram_max);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let doc_vec = self.backend.embed(text).await?;
        let cand_vecs = self.backend.embed_batch(&candidates).await?;
        if cand_vecs.len() != candidates.len() {
            return Err(Error::Extraction(format!(
                "embedding batch returned {} vectors for {} candidates",
                cand_vecs.len(),
                candidates.len()
            )));
        }

        let mut scored: Vec<(String, f32, Vec<f32>)> = candidates
            .into_iter()
            .zip(cand_vecs)
            .map(|(phrase, vec)| {
                let relevance = cosine_similarity(&doc_vec, &vec);
                (phrase, relevance, vec)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.candidate_pool);

        Ok(diversify(scored))
    }
}

/// Semantic extraction strategy wrapping a [`KeywordScorer`] with fixed
/// extraction parameters.
pub struct SemanticExtractor {
    scorer: Arc<dyn KeywordScorer>,
    top_k: usize,
}

impl SemanticExtractor {
    pub fn new(scorer: Arc<dyn KeywordScorer>, top_k: usize) -> Self {
        Self { scorer, top_k }
    }

    /// Extract the `top_k` best keyphrases for raw text.
    ///
    /// Empty or whitespace-only text returns an empty sequence without
    /// invoking the scorer.
    pub async fn extract(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Long documents are scored on a prefix; keyphrases are almost
        // always established early and scorer latency grows with length.
        let scored_text = match text.char_indices().nth(MAX_SCORED_TEXT_CHARS) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        };

        let ranked = self.scorer.score_candidates(scored_text).await?;
        let keywords: Vec<String> = ranked
            .into_iter()
            .take(self.top_k)
            .map(|(phrase, _)| phrase)
            .collect();

        debug!(
            subsystem = "extract",
            component = "semantic",
            op = "extract",
            keyword_count = keywords.len(),
            "Semantic extraction complete"
        );
        Ok(keywords)
    }
}
