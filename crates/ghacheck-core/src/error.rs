//! The uniform error taxonomy (C8) binding schema errors to the outer
//! document/call chain.

use ghacheck_models::SchemaError;

/// Transport-level failures raised by a [`crate::fetch::RepositoryFetcher`]
/// or [`crate::fetch::LocalFetcher`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("{0}: no such file")]
    FileNotFound(String),
    #[error("GitHub API: not found")]
    GitHubApiNotFound,
    #[error("GitHub API: rate limited, resets at epoch {reset_epoch}")]
    GitHubApiRateLimited { reset_epoch: u64 },
    #[error("GitHub API: unauthorized")]
    GitHubApiUnauthorized,
    #[error("GitHub API error (status {status}): {message}")]
    GitHubApiError { status: u16, message: String },
    #[error("network error: {0}")]
    NetworkError(String),
}

/// A document failed to load or failed schema validation. These are cached
/// alongside successful loads so a failing callee is never retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("workflow failed schema validation")]
    WorkflowSchema {
        errors: Vec<SchemaError>,
        referenced_by: Option<String>,
    },
    #[error("action failed schema validation")]
    ActionSchema {
        errors: Vec<SchemaError>,
        referenced_by: Option<String>,
    },
    #[error("workflow not found: {target}")]
    WorkflowNotFound {
        target: String,
        referenced_by: Option<String>,
    },
    #[error("action not found: {target}")]
    ActionNotFound {
        target: String,
        referenced_by: Option<String>,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl DocumentError {
    pub fn referenced_by(&self) -> Option<&str> {
        match self {
            DocumentError::WorkflowSchema { referenced_by, .. }
            | DocumentError::ActionSchema { referenced_by, .. }
            | DocumentError::WorkflowNotFound { referenced_by, .. }
            | DocumentError::ActionNotFound { referenced_by, .. } => referenced_by.as_deref(),
            DocumentError::Fetch(_) => None,
        }
    }
}

/// Fatal errors surfaced by the analyzer. The first one raised aborts the
/// run; outstanding sibling work may still complete, but its results are
/// discarded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("{0}")]
    Runtime(String),
}
