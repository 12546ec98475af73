//! Fetch capabilities (C5): local filesystem and GitHub repository objects.

pub mod github_graphql;
pub mod github_rest;
pub mod local;

use async_trait::async_trait;

use crate::error::FetchError;

pub use github_graphql::GitHubGraphqlFetcher;
pub use github_rest::GitHubRestFetcher;
pub use local::FilesystemFetcher;

#[async_trait]
pub trait LocalFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        r#ref: &str,
        path: &str,
    ) -> Result<String, FetchError>;
}

/// Fetches `action.yml`, retrying once with `action.yaml` on not-found.
pub async fn fetch_action_metadata(
    fetcher: &dyn RepositoryFetcher,
    owner: &str,
    repo: &str,
    r#ref: &str,
    subdirectory: Option<&str>,
) -> Result<String, FetchError> {
    let base = match subdirectory {
        Some(s) => format!("{s}/"),
        None => String::new(),
    };

    match fetcher
        .fetch_file(owner, repo, r#ref, &format!("{base}action.yml"))
        .await
    {
        Err(FetchError::GitHubApiNotFound) | Err(FetchError::FileNotFound(_)) => {
            fetcher
                .fetch_file(owner, repo, r#ref, &format!("{base}action.yaml"))
                .await
        }
        other => other,
    }
}

/// Classifies a failed HTTP response per the shared GitHub API rules:
/// 401 unauthorized, 403 with an exhausted rate limit, 429, 404, else a
/// generic API error.
pub(crate) fn classify_http_error(
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
) -> FetchError {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return FetchError::GitHubApiUnauthorized;
    }

    let rate_limited = status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || (status == reqwest::StatusCode::FORBIDDEN
            && headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"));
    if rate_limited {
        let reset_epoch = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        return FetchError::GitHubApiRateLimited { reset_epoch };
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return FetchError::GitHubApiNotFound;
    }

    FetchError::GitHubApiError {
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or("unknown status").into(),
    }
}
