// Document sources
// Raw text documents fed into the ingestion pipeline

pub mod directory;
pub mod github;

use async_trait::async_trait;

pub use directory::DirectorySource;
pub use github::GitHubSource;

/// Raw text plus where it came from. Plain-text sources always use page 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub source: String,
    pub page: u32,
}

impl Document {
    #[inline]
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page: 0,
        }
    }
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch every document, in a stable order
    async fn load(&self) -> crate::Result<Vec<Document>>;
}

/// Whether `path` ends in one of `extensions` (without the leading dot)
pub(crate) fn has_allowed_extension(path: &str, extensions: &[String]) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}
