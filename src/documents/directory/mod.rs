
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Document, DocumentSource, has_allowed_extension};
use crate::{Result, WisestError};

/// Loads text files from a local directory tree.
///
/// Sources are the `/`-separated path relative to the root, so IDs match the
/// ones a repository checkout of the same files would produce.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    #[inline]
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    fn relative_source(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(WisestError::Source(format!(
                "Not a directory: {}",
                self.root.display()
            )));
        }

        let mut documents = Vec::new();
        let mut skipped = 0usize;
        let entries = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file());

        for entry in entries {
            let Some(source) = self.relative_source(entry.path()) else {
                warn!("Skipping non UTF-8 path: {}", entry.path().display());
                continue;
            };
            if !has_allowed_extension(&source, &self.extensions) {
                debug!("Skipping {}", source);
                continue;
            }

            match tokio::fs::read_to_string(entry.path()).await {
                Ok(content) => {
                    info!("Loaded {}", source);
                    documents.push(Document::new(source, content));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", source, e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {} unreadable files under {}", skipped, self.root.display());
        }
        Ok(documents)
    }
}
