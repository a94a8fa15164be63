
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{Document, DocumentSource, has_allowed_extension};
use crate::config::IngestConfig;
use crate::http::HttpClient;
use crate::{Result, WisestError};

/// Loads text files under a path prefix of a GitHub repository
#[derive(Debug, Clone)]
pub struct GitHubSource {
    api_url: Url,
    raw_url: Url,
    repository: String,
    branch: String,
    path_prefix: String,
    extensions: Vec<String>,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GitHubSource {
    #[inline]
    pub fn new(config: &IngestConfig, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(&config.github_api_url)
            .map_err(|e| WisestError::Config(format!("Invalid GitHub API URL: {}", e)))?;
        let raw_url = Url::parse(&config.raw_content_url)
            .map_err(|e| WisestError::Config(format!("Invalid raw content URL: {}", e)))?;

        let mut http = HttpClient::new(timeout)
            .with_header("Accept", "application/vnd.github+json")
            .with_header("User-Agent", concat!("wisest/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = token {
            http = http.with_header("Authorization", format!("token {}", token));
        }

        Ok(Self {
            api_url,
            raw_url,
            repository: config.repository.clone(),
            branch: config.branch.clone(),
            path_prefix: config.path_prefix.clone(),
            extensions: config.extensions.clone(),
            http,
        })
    }

    fn tree_url(&self) -> Result<Url> {
        let mut url = join(
            &self.api_url,
            &format!("repos/{}/git/trees/{}", self.repository, self.branch),
        )?;
        url.query_pairs_mut().append_pair("recursive", "1");
        Ok(url)
    }

    fn raw_file_url(&self, path: &str) -> Result<Url> {
        join(
            &self.raw_url,
            &format!("{}/{}/{}", self.repository, self.branch, path),
        )
    }

    fn wanted(&self, item: &TreeItem) -> bool {
        item.kind == "blob"
            && item.path.starts_with(&self.path_prefix)
            && has_allowed_extension(&item.path, &self.extensions)
    }
}

#[async_trait]
impl DocumentSource for GitHubSource {
    async fn load(&self) -> Result<Vec<Document>> {
        let tree_url = self.tree_url()?;
        debug!("Listing repository tree for {}", self.repository);

        let tree: TreeResponse = self.http.get_json(&tree_url).await?;
        if tree.truncated {
            return Err(WisestError::Source(format!(
                "Repository tree for {} was truncated by GitHub",
                self.repository
            )));
        }

        let mut documents = Vec::new();
        let mut skipped = 0usize;
        for item in tree.tree.iter().filter(|item| self.wanted(item)) {
            match self.http.get_text(&self.raw_file_url(&item.path)?).await {
                Ok(content) => {
                    info!("Loaded {}", item.path);
                    documents.push(Document::new(item.path.clone(), content));
                }
                Err(e) => {
                    warn!("Skipping {}: {}", item.path, e);
                    skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} documents from {} ({} skipped)",
            documents.len(),
            self.repository,
            skipped
        );
        Ok(documents)
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    let base = if base.path().ends_with('/') {
        base.clone()
    } else {
        let mut base = base.clone();
        base.set_path(&format!("{}/", base.path()));
        base
    };
    base.join(path)
        .map_err(|e| WisestError::Source(format!("Failed to build URL for {}: {}", path, e)))
}
