use crate::application::use_cases::generate::ContentSupplier;
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use encoding_rs::UTF_8;
use std::path::PathBuf;

/// An uploaded document, read as raw text.
///
/// A byte-order mark selects UTF-8 or UTF-16; anything else is decoded as
/// UTF-8 with malformed sequences replaced.
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn decode_document(bytes: &[u8]) -> String {
    let (text, encoding, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = encoding.name(), "document contained malformed bytes");
    }
    text.into_owned()
}

#[async_trait]
impl ContentSupplier for DocumentFile {
    async fn content(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", self.path.display(), e)))?;
        Ok(decode_document(&bytes))
    }
}
