use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PanlinkError, Result};

/// A discovered text document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// Discover text documents under `root`, sorted by relative path.
///
/// A file path is returned as-is. For a directory, the tree is walked
/// recursively and files with a `.txt`, `.text` or `.md` extension
/// (case-insensitive) are kept.
pub fn discover_documents(root: &Path) -> Result<Vec<DocumentFile>> {
    if root.is_file() {
        return Ok(vec![DocumentFile {
            relative_path: root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            absolute_path: root.to_path_buf(),
        }]);
    }

    if !root.is_dir() {
        return Err(PanlinkError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input path does not exist: {}", root.display()),
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        if !matches!(extension.as_str(), "txt" | "text" | "md") {
            continue;
        }

        let relative_path = path
            .strip_prefix(root)
            .map_err(|_| {
                PanlinkError::Config(format!(
                    "Failed to compute relative path for: {}",
                    path.display()
                ))
            })?
            .to_string_lossy()
            .to_string();

        documents.push(DocumentFile {
            relative_path,
            absolute_path: path.to_path_buf(),
        });
    }

    documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::info!("Discovered {} document(s) in {}", documents.len(), root.display());
    Ok(documents)
}
