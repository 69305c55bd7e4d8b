//! Filesystem-backed [`DocumentHost`]: a directory tree of markdown files.
//!
//! Documents are the `.md` files below the vault root, identified by their
//! `/`-separated path relative to the root. Hidden directories (`.git`,
//! `.obsidian`, the settings directory, ...) are not descended into.
//! Metadata and content are read from disk on every call; nothing is cached.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::contract::DocumentHost;
use crate::document::{Document, Metadata};
use crate::error::HostError;
use crate::frontmatter;

#[derive(Debug, Clone)]
pub struct VaultHost {
    root: PathBuf,
    active: Option<PathBuf>,
}

impl VaultHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        VaultHost {
            root: root.into(),
            active: None,
        }
    }

    /// Marks `path` (absolute, or relative to the vault root) as the focused
    /// document.
    pub fn with_active(mut self, path: impl Into<PathBuf>) -> Self {
        self.active = Some(path.into());
        self
    }

    fn absolute(&self, document: &Document) -> PathBuf {
        self.root.join(&document.path)
    }

    /// Vault-relative, `/`-separated identifier. Paths outside the vault keep
    /// their full, absolute form.
    fn relative_path(&self, path: &Path) -> String {
        let root = lexical_absolute(&self.root);
        let path = lexical_absolute(path);
        match path.strip_prefix(&root) {
            Ok(rel) => rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    async fn load_document(&self, rel_path: String) -> Result<Document, HostError> {
        let mut document = Document::new(rel_path, None);
        document.metadata = self.metadata(&document).await?;
        Ok(document)
    }
}

/// Absolute form of `path` with `.` and `..` resolved textually, without
/// touching the filesystem.
fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Recursively collects markdown files below `dir`, skipping hidden
/// directories. Results are sorted for a stable iteration order.
fn collect_markdown(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    fn visit_dir(dir: &Path, results: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry_res in std::fs::read_dir(dir)? {
            let entry = entry_res?;
            let path = entry.path();
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if path.is_dir() {
                if file_name.starts_with('.') {
                    debug!(path = %path.display(), "Skipping hidden directory");
                    continue;
                }
                visit_dir(&path, results)?;
            } else if path.is_file() && is_markdown(&path) {
                results.push(path);
            }
        }
        Ok(())
    }

    let mut results = Vec::new();
    visit_dir(dir, &mut results)?;
    results.sort();
    Ok(results)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

#[async_trait]
impl DocumentHost for VaultHost {
    async fn list_documents(&self) -> Result<Vec<Document>, HostError> {
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || collect_markdown(&root))
            .await?
            .map_err(|e| {
                error!(error = ?e, root = %self.root.display(), "Failed to scan vault");
                e
            })?;

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let rel_path = self.relative_path(&path);
            match self.load_document(rel_path.clone()).await {
                Ok(document) => documents.push(document),
                // Unreadable files are listed without metadata, so the selector skips them.
                Err(e) => {
                    warn!(path = %rel_path, error = %e, "Failed to read document metadata");
                    documents.push(Document::new(rel_path, None));
                }
            }
        }
        info!(root = %self.root.display(), count = documents.len(), "Scanned vault");
        Ok(documents)
    }

    async fn metadata(&self, document: &Document) -> Result<Option<Metadata>, HostError> {
        let content = self.read_content(document).await?;
        Ok(frontmatter::parse(&content))
    }

    async fn read_content(&self, document: &Document) -> Result<String, HostError> {
        let path = self.absolute(document);
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            HostError::from(format!("failed to read {}: {e}", path.display()))
        })
    }

    async fn active_document(&self) -> Result<Option<Document>, HostError> {
        let Some(active) = &self.active else {
            return Ok(None);
        };
        let absolute = if active.is_absolute() {
            active.clone()
        } else {
            self.root.join(active)
        };
        let document = self.load_document(self.relative_path(&absolute)).await?;
        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_detection_is_case_insensitive() {
        assert!(is_markdown(Path::new("a/Note.md")));
        assert!(is_markdown(Path::new("README.MD")));
        assert!(!is_markdown(Path::new("image.png")));
        assert!(!is_markdown(Path::new("md")));
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let host = VaultHost::new("/vault");
        assert_eq!(
            host.relative_path(Path::new("/vault/journal/Day One.md")),
            "journal/Day One.md"
        );
        assert_eq!(
            host.relative_path(Path::new("/vault/journal/../drafts/./x.md")),
            "drafts/x.md"
        );
        assert_eq!(host.relative_path(Path::new("/vault/../other.md")), "/other.md");
    }
}
