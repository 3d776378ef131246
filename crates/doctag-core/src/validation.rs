//! Upload validation against the content-type allow-list.
//!
//! Runs before any side effect: a rejected upload leaves no blob, no row,
//! and nothing to clean up.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Text-bearing document formats accepted for ingestion.
pub static ALLOWED_CONTENT_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/pdf",
        "text/plain",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ]
    .into_iter()
    .collect()
});

/// Binary formats whose magic bytes are authoritative. When `infer`
/// detects one of these and it differs from the claim, the claim is wrong.
fn claimed_is_binary(claimed: &str) -> bool {
    claimed != "text/plain"
}

/// Validate an upload before any side effect occurs.
///
/// Checks, in order: non-empty payload, size limit, content-type
/// allow-list, and magic-byte/claim agreement for binary formats.
pub fn validate_upload(
    filename: &str,
    claimed_type: &str,
    data: &[u8],
    max_size_bytes: u64,
) -> Result<()> {
    if data.is_empty() {
        return Err(Error::Validation(format!("empty upload: {}", filename)));
    }

    if data.len() as u64 > max_size_bytes {
        return Err(Error::Validation(format!(
            "file exceeds maximum size of {} bytes",
            max_size_bytes
        )));
    }

    if !ALLOWED_CONTENT_TYPES.contains(claimed_type) {
        return Err(Error::Validation(format!(
            "unsupported content type: {}",
            claimed_type
        )));
    }

    // Magic-byte mismatch guard: a claimed binary format with detectable
    // magic bytes must actually match the claim. Text formats have no
    // magic bytes and are trusted as claimed.
    if claimed_is_binary(claimed_type) {
        if let Some(kind) = infer::get(data) {
            let detected = kind.mime_type();
            if detected != claimed_type && !office_alias(claimed_type, detected) {
                return Err(Error::Validation(format!(
                    "content type mismatch: claimed {}, detected {}",
                    claimed_type, detected
                )));
            }
        }
    }

    Ok(())
}

/// OOXML formats (docx/xlsx/pptx) are zip containers; legacy Office
/// formats share the OLE compound-file signature. Treat those detections
/// as consistent with the claim.
fn office_alias(claimed: &str, detected: &str) -> bool {
    let claimed_office = claimed.starts_with("application/vnd.") || claimed == "application/msword";
    claimed_office
        && matches!(
            detected,
            "application/zip" | "application/x-ole-storage" | "application/x-cfb"
        )
}
