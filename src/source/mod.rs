//! Document text acquisition.
//!
//! Converting PDFs and other binary formats to text happens upstream; this
//! module reads the resulting plain-text documents.

mod walker;

pub use walker::{discover_documents, DocumentFile};

use std::path::Path;

use crate::error::{PanlinkError, Result};

/// Anything that can turn a document into a single string.
pub trait TextSource {
    fn get_text(&self, path: &Path) -> Result<String>;
}

/// Reads UTF-8 text files. Form feeds (page breaks from text extraction
/// tools) become newlines so each page starts on its own line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn get_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            PanlinkError::Parse(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;

        let pages: Vec<&str> = text.split('\u{000C}').collect();
        log::debug!("Read {} ({} page(s))", path.display(), pages.len());
        Ok(pages.join("\n"))
    }
}
