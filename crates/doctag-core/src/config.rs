//! Runtime configuration for the ingestion pipeline.

use crate::defaults;

/// Tunables for one `IngestService` instance.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Keywords extracted (and tags linked) per document.
    pub keyword_count: usize,
    /// Corpus size below which the semantic strategy runs.
    pub cold_start_threshold: i64,
    /// Maximum accepted upload size in bytes.
    pub max_file_size_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            keyword_count: defaults::KEYWORD_COUNT,
            cold_start_threshold: defaults::COLD_START_THRESHOLD,
            max_file_size_bytes: defaults::MAX_FILE_SIZE_BYTES,
        }
    }
}

impl IngestConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `DOCTAG_KEYWORD_COUNT`,
    /// `DOCTAG_COLD_START_THRESHOLD`, `DOCTAG_MAX_FILE_SIZE_BYTES`.
    pub fn from_env() -> Self {
        let keyword_count = std::env::var("DOCTAG_KEYWORD_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::KEYWORD_COUNT);

        let cold_start_threshold = std::env::var("DOCTAG_COLD_START_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::COLD_START_THRESHOLD);

        let max_file_size_bytes = std::env::var("DOCTAG_MAX_FILE_SIZE_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::MAX_FILE_SIZE_BYTES);

        Self {
            keyword_count,
            cold_start_threshold,
            max_file_size_bytes,
        }
    }
}
