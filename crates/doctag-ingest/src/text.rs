//! Built-in text extraction for plain-text uploads.
//!
//! Binary formats (PDF, Office) are the business of dedicated extraction
//! services behind the same trait; this extractor handles the formats that
//! need no parser and reports everything else as unsupported.

use async_trait::async_trait;

use doctag_core::{Result, TextExtractor};

/// [`TextExtractor`] for `text/*` payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, data: &[u8], content_type: &str) -> Result<Option<String>> {
        if !content_type.starts_with("text/") {
            return Ok(None);
        }
        // Lossy decoding: a stray invalid byte should not cost the whole
        // document its text.
        Ok(Some(String::from_utf8_lossy(data).into_owned()))
    }
}
