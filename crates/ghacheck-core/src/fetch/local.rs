//! The local filesystem fetcher (C5).

use async_trait::async_trait;
use camino::Utf8PathBuf;

use super::LocalFetcher;
use crate::error::FetchError;

/// Resolves workflow paths relative to a project root.
pub struct FilesystemFetcher {
    root: Utf8PathBuf,
}

impl FilesystemFetcher {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl LocalFetcher for FilesystemFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let resolved = self.root.join(path);
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|_| FetchError::FileNotFound(resolved.into_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let fetcher = FilesystemFetcher::new(Utf8PathBuf::from("/nonexistent-ghacheck-root"));
        let err = fetcher.fetch("workflow.yml").await.unwrap_err();
        assert!(matches!(err, FetchError::FileNotFound(_)));
    }
}
