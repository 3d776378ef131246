//! Structured logging schema and field name constants for doctag.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, pipeline degraded gracefully |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "ingest", "db", "search", "extract", "core"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "tag_reconciler", "tfidf", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "delete", "reconcile", "extract"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Owner UUID of the document being operated on.
pub const OWNER_ID: &str = "owner_id";

/// Pipeline stage name ("validate", "store", "persist", "extract_text",
/// "index", "extract_keywords", "tag").
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of keywords produced by an extraction strategy.
pub const KEYWORD_COUNT: &str = "keyword_count";

/// Number of tags reconciled or linked.
pub const TAG_COUNT: &str = "tag_count";

/// Corpus size observed by the hybrid selector.
pub const CORPUS_SIZE: &str = "corpus_size";

/// Extraction method chosen ("semantic", "statistical").
pub const METHOD: &str = "method";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
