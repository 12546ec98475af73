//! The document cache (C6, "FileReader" in the spec's own terms):
//! memoizes workflow/action loads per distinct target so each is fetched
//! and parsed at most once per analyzer run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ghacheck_models::path::Path as SchemaPath;
use ghacheck_models::workflow::job::UsesJob;
use ghacheck_models::{Action, SchemaError, SchemaObject, Workflow, read_action, read_workflow};
use tokio::sync::OnceCell;

use crate::error::{DocumentError, FetchError};
use crate::fetch::{LocalFetcher, RepositoryFetcher, fetch_action_metadata};

type Cell<T> = Arc<OnceCell<Result<Arc<T>, DocumentError>>>;

/// Deduplicates and memoizes document loads. Cache entries live for the
/// duration of one analyzer run; both successes and failures are cached,
/// so a failing callee is never retried.
pub struct DocumentCache {
    local: Arc<dyn LocalFetcher>,
    repository: Arc<dyn RepositoryFetcher>,
    workflows_fs: Mutex<HashMap<String, Cell<Workflow>>>,
    workflows_repo: Mutex<HashMap<String, Cell<Workflow>>>,
    actions_repo: Mutex<HashMap<String, Cell<Action>>>,
}

impl DocumentCache {
    pub fn new(local: Arc<dyn LocalFetcher>, repository: Arc<dyn RepositoryFetcher>) -> Self {
        Self {
            local,
            repository,
            workflows_fs: Mutex::new(HashMap::new()),
            workflows_repo: Mutex::new(HashMap::new()),
            actions_repo: Mutex::new(HashMap::new()),
        }
    }

    fn cell_for<T>(map: &Mutex<HashMap<String, Cell<T>>>, key: &str) -> Cell<T> {
        map.lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    pub async fn workflow_from_filesystem(
        &self,
        path: &str,
        referenced_by: Option<String>,
    ) -> Result<Arc<Workflow>, DocumentError> {
        let cell = Self::cell_for(&self.workflows_fs, path);
        cell.get_or_init(|| async {
            match self.local.fetch(path).await {
                Ok(contents) => Self::parse_workflow(&contents, Some(path.to_string()), &referenced_by),
                Err(err) => Err(workflow_fetch_error(err, path.to_string(), referenced_by.clone())),
            }
        })
        .await
        .clone()
    }

    pub async fn workflow_from_repository(
        &self,
        owner: &str,
        repo: &str,
        filename: &str,
        r#ref: &str,
        raw: &str,
        referenced_by: Option<String>,
    ) -> Result<Arc<Workflow>, DocumentError> {
        let cell = Self::cell_for(&self.workflows_repo, raw);
        cell.get_or_init(|| async {
            let path = format!(".github/workflows/{filename}");
            match self.repository.fetch_file(owner, repo, r#ref, &path).await {
                Ok(contents) => Self::parse_workflow(&contents, None, &referenced_by),
                Err(err) => Err(workflow_fetch_error(err, raw.to_string(), referenced_by.clone())),
            }
        })
        .await
        .clone()
    }

    pub async fn action_from_repository(
        &self,
        owner: &str,
        repo: &str,
        subdirectory: Option<&str>,
        r#ref: &str,
        raw: &str,
        referenced_by: Option<String>,
    ) -> Result<Arc<Action>, DocumentError> {
        let cell = Self::cell_for(&self.actions_repo, raw);
        cell.get_or_init(|| async {
            match fetch_action_metadata(self.repository.as_ref(), owner, repo, r#ref, subdirectory)
                .await
            {
                Ok(contents) => Self::parse_action(&contents, referenced_by.clone()),
                Err(err) => Err(action_fetch_error(err, raw.to_string(), referenced_by.clone())),
            }
        })
        .await
        .clone()
    }

    fn parse_workflow(
        contents: &str,
        path: Option<String>,
        referenced_by: &Option<String>,
    ) -> Result<Arc<Workflow>, DocumentError> {
        match read_workflow(contents) {
            Ok(result) if result.errors.is_empty() => {
                let mut workflow = result.workflow;
                workflow.path = path;
                Ok(Arc::new(workflow))
            }
            Ok(result) => Err(DocumentError::WorkflowSchema {
                errors: result.errors,
                referenced_by: referenced_by.clone(),
            }),
            Err(not_a_mapping) => Err(DocumentError::WorkflowSchema {
                errors: vec![SchemaError::new(
                    SchemaObject::Workflow,
                    &SchemaPath::root(),
                    not_a_mapping.to_string(),
                )],
                referenced_by: referenced_by.clone(),
            }),
        }
    }

    fn parse_action(
        contents: &str,
        referenced_by: Option<String>,
    ) -> Result<Arc<Action>, DocumentError> {
        match read_action(contents) {
            Ok(result) if result.errors.is_empty() => Ok(Arc::new(result.action)),
            Ok(result) => Err(DocumentError::ActionSchema {
                errors: result.errors,
                referenced_by,
            }),
            Err(not_a_mapping) => Err(DocumentError::ActionSchema {
                errors: vec![SchemaError::new(
                    SchemaObject::Action,
                    &SchemaPath::root(),
                    not_a_mapping.to_string(),
                )],
                referenced_by,
            }),
        }
    }
}

fn workflow_fetch_error(
    err: FetchError,
    target: String,
    referenced_by: Option<String>,
) -> DocumentError {
    match err {
        FetchError::FileNotFound(_) | FetchError::GitHubApiNotFound => {
            DocumentError::WorkflowNotFound { target, referenced_by }
        }
        other => DocumentError::Fetch(other),
    }
}

fn action_fetch_error(
    err: FetchError,
    target: String,
    referenced_by: Option<String>,
) -> DocumentError {
    match err {
        FetchError::FileNotFound(_) | FetchError::GitHubApiNotFound => {
            DocumentError::ActionNotFound { target, referenced_by }
        }
        other => DocumentError::Fetch(other),
    }
}

/// Resolves a job's `uses:` specifier against either cache map, sharing the
/// lookup logic between the filesystem and repository cases.
pub(crate) async fn load_called_workflow(
    cache: &DocumentCache,
    job: &UsesJob,
    referenced_by: String,
) -> Result<Arc<Workflow>, DocumentError> {
    use ghacheck_models::workflow::WorkflowCallSpecifier;

    match &job.uses {
        WorkflowCallSpecifier::Filesystem { path } => {
            cache.workflow_from_filesystem(path, Some(referenced_by)).await
        }
        WorkflowCallSpecifier::Repository {
            owner,
            repo,
            filename,
            r#ref,
            raw,
        } => {
            cache
                .workflow_from_repository(owner, repo, filename, r#ref, raw, Some(referenced_by))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        contents: String,
    }

    #[async_trait]
    impl LocalFetcher for CountingFetcher {
        async fn fetch(&self, _path: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.contents.clone())
        }
    }

    struct UnusedRepositoryFetcher;

    #[async_trait]
    impl RepositoryFetcher for UnusedRepositoryFetcher {
        async fn fetch_file(
            &self,
            _owner: &str,
            _repo: &str,
            _ref: &str,
            _path: &str,
        ) -> Result<String, FetchError> {
            Err(FetchError::GitHubApiNotFound)
        }
    }

    #[tokio::test]
    async fn dedupes_concurrent_loads_of_the_same_path() {
        let local = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            contents: "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: ok\n".into(),
        });
        let cache = DocumentCache::new(local.clone(), Arc::new(UnusedRepositoryFetcher));

        let (a, b) = tokio::join!(
            cache.workflow_from_filesystem("ci.yml", None),
            cache.workflow_from_filesystem("ci.yml", None),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caches_failures_without_retrying() {
        struct FailingFetcher {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl LocalFetcher for FailingFetcher {
            async fn fetch(&self, path: &str) -> Result<String, FetchError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::FileNotFound(path.to_string()))
            }
        }

        let local = Arc::new(FailingFetcher { calls: AtomicUsize::new(0) });
        let cache = DocumentCache::new(local.clone(), Arc::new(UnusedRepositoryFetcher));

        assert!(cache.workflow_from_filesystem("missing.yml", None).await.is_err());
        assert!(cache.workflow_from_filesystem("missing.yml", None).await.is_err());
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
    }
}
