//! Centralized default constants for the doctag system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// KEYWORD EXTRACTION
// =============================================================================

/// Number of keywords extracted per document.
pub const KEYWORD_COUNT: usize = 3;

/// Corpus-size threshold for the hybrid extraction selector.
///
/// Below this many indexed documents, TF-IDF rarity is meaningless (the
/// document-frequency denominator degenerates), so the semantic strategy
/// runs instead. At or above the threshold the statistical strategy runs.
pub const COLD_START_THRESHOLD: i64 = 10;

/// Minimum term character length kept by the statistical strategy.
pub const TERM_MIN_CHARS: usize = 2;

/// Maximum term character length kept by the statistical strategy.
/// Longer terms are index artifacts, not keywords.
pub const TERM_MAX_CHARS: usize = 30;

/// Candidate pool size the semantic strategy oversamples before
/// diversity-aware selection.
pub const SEMANTIC_CANDIDATE_POOL: usize = 20;

/// Maximum tokens per candidate phrase for the semantic strategy.
pub const SEMANTIC_NGRAM_MAX: usize = 2;

/// Upper bound on the text length sent to a keyword scorer, in characters.
pub const MAX_SCORED_TEXT_CHARS: usize = 5_000;

// =============================================================================
// UPLOAD VALIDATION
// =============================================================================

/// Maximum accepted upload size in bytes (50 MB).
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// Default search-index base URL.
pub const SEARCH_URL: &str = "http://127.0.0.1:9200";

/// Default index name for document content.
pub const SEARCH_INDEX_NAME: &str = "documents";

/// Timeout for search-index requests in seconds.
pub const SEARCH_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding server base URL.
pub const EMBED_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;
