//! The cross-document analyzer (C7): walks a validated workflow's jobs and
//! steps, resolves every `uses:` edge through the document cache, and
//! checks that required callee inputs are satisfied and type-compatible.

use std::sync::Arc;

use ghacheck_models::workflow::ActionSpecifier;
use ghacheck_models::workflow::job::{StepsJob, UsesJob};
use ghacheck_models::{Job, Step, Workflow};

use crate::cache::{DocumentCache, load_called_workflow};
use crate::compat;
use crate::error::AnalyzeError;

pub struct Analyzer {
    cache: Arc<DocumentCache>,
}

impl Analyzer {
    pub fn new(cache: Arc<DocumentCache>) -> Self {
        Self { cache }
    }

    /// Loads and analyzes the workflow at `path`, which must already have
    /// been confirmed schema-valid (the cache never hands a schema-invalid
    /// workflow to the analyzer).
    pub async fn analyze_workflow_file(&self, path: &str) -> Result<(), AnalyzeError> {
        let workflow = self.cache.workflow_from_filesystem(path, None).await?;
        self.analyze_workflow(&workflow, path).await
    }

    async fn analyze_workflow(&self, workflow: &Workflow, referenced_by: &str) -> Result<(), AnalyzeError> {
        let analyses = workflow.jobs.iter().map(|(id, job)| {
            let referenced_by = referenced_by.to_string();
            async move { self.analyze_job(id, job, referenced_by).await }
        });
        futures::future::try_join_all(analyses).await?;
        Ok(())
    }

    async fn analyze_job(&self, job_id: &str, job: &Job, referenced_by: String) -> Result<(), AnalyzeError> {
        match job {
            Job::Uses(uses_job) => self.analyze_workflow_call_job(job_id, uses_job, referenced_by).await,
            Job::Steps(steps_job) => self.analyze_steps_job(job_id, steps_job, referenced_by).await,
        }
    }

    async fn analyze_workflow_call_job(
        &self,
        job_id: &str,
        job: &UsesJob,
        referenced_by: String,
    ) -> Result<(), AnalyzeError> {
        let callee = load_called_workflow(&self.cache, job, referenced_by).await?;

        let Some(workflow_call) = callee.on.workflow_call() else {
            return Err(AnalyzeError::Runtime(format!(
                "job `{job_id}` using a workflow requires `on.workflow_call:` in the called workflow"
            )));
        };

        for (input_id, input) in &workflow_call.inputs {
            if !input.common.required || compat::has_default(&input.ty) {
                continue;
            }

            match job.with.get(input_id) {
                None => {
                    return Err(AnalyzeError::Runtime(format!(
                        "input `{input_id}` is required to call workflow from job `{job_id}`"
                    )));
                }
                Some(value) => {
                    if compat::is_unknown_scalar(value) {
                        continue;
                    }
                    if !compat::is_compatible(&input.ty, value) {
                        return Err(AnalyzeError::Runtime(format!(
                            "input `{input_id}` is a `{expected}` input and job `{job_id}` cannot call workflow with a `{actual}` value",
                            expected = compat::type_name(&input.ty),
                            actual = compat::scalar_kind(value),
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    async fn analyze_steps_job(
        &self,
        job_id: &str,
        job: &StepsJob,
        referenced_by: String,
    ) -> Result<(), AnalyzeError> {
        for (index, step) in job.steps.iter().enumerate() {
            let Step::Uses(uses_step) = step else {
                continue;
            };
            let ActionSpecifier::Repository {
                owner,
                repo,
                subdirectory,
                r#ref,
                raw,
            } = &uses_step.uses
            else {
                // Docker and filesystem actions have no known metadata source.
                continue;
            };

            let action = self
                .cache
                .action_from_repository(
                    owner,
                    repo,
                    subdirectory.as_deref(),
                    r#ref,
                    raw,
                    Some(referenced_by.clone()),
                )
                .await?;

            for (input_id, input) in &action.inputs {
                if !input.required || input.default.is_some() {
                    continue;
                }
                if !uses_step.with.contains_key(input_id) {
                    let label = step.label(index);
                    return Err(AnalyzeError::Runtime(format!(
                        "input `{input_id}` is required to call action `{raw}` from `{label}` in job `{job_id}`"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::{LocalFetcher, RepositoryFetcher};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher {
        files: HashMap<String, String>,
    }

    #[async_trait]
    impl LocalFetcher for MapFetcher {
        async fn fetch(&self, path: &str) -> Result<String, FetchError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| FetchError::FileNotFound(path.to_string()))
        }
    }

    struct NoRepositoryFetcher;

    #[async_trait]
    impl RepositoryFetcher for NoRepositoryFetcher {
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

    fn analyzer_for(files: &[(&str, &str)]) -> Analyzer {
        let files = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let cache = DocumentCache::new(
            Arc::new(MapFetcher { files }),
            Arc::new(NoRepositoryFetcher),
        );
        Analyzer::new(Arc::new(cache))
    }

    #[tokio::test]
    async fn scenario_s1_missing_workflow_call() {
        let analyzer = analyzer_for(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./verify.yml } }\n",
            ),
            (
                "verify.yml",
                "on: { pull_request:, push: }\njobs: { verify: { runs-on: ubuntu-latest, steps: [ { run: echo verified } ] } }\n",
            ),
        ]);

        let err = analyzer.analyze_workflow_file("release.yml").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "job `verify` using a workflow requires `on.workflow_call:` in the called workflow"
        );
    }

    #[tokio::test]
    async fn scenario_s2_required_input_missing_with() {
        let analyzer = analyzer_for(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./verify.yml } }\n",
            ),
            (
                "verify.yml",
                "on:\n  workflow_call:\n    inputs:\n      run_tests:\n        type: boolean\n        required: true\njobs: { verify: { runs-on: ubuntu-latest, steps: [ { run: echo hi } ] } }\n",
            ),
        ]);

        let err = analyzer.analyze_workflow_file("release.yml").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "input `run_tests` is required to call workflow from job `verify`"
        );
    }

    #[tokio::test]
    async fn scenario_s3_required_input_wrong_type() {
        let analyzer = analyzer_for(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./verify.yml, with: { run_tests: 'frequent flyer miles' } } }\n",
            ),
            (
                "verify.yml",
                "on:\n  workflow_call:\n    inputs:\n      run_tests:\n        type: boolean\n        required: true\njobs: { verify: { runs-on: ubuntu-latest, steps: [ { run: echo hi } ] } }\n",
            ),
        ]);

        let err = analyzer.analyze_workflow_file("release.yml").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "input `run_tests` is a `boolean` input and job `verify` cannot call workflow with a `string` value"
        );
    }

    #[tokio::test]
    async fn scenario_s4_required_input_with_default_succeeds() {
        let analyzer = analyzer_for(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./verify.yml } }\n",
            ),
            (
                "verify.yml",
                "on:\n  workflow_call:\n    inputs:\n      run_tests:\n        type: boolean\n        required: true\n        default: true\njobs: { verify: { runs-on: ubuntu-latest, steps: [ { run: echo hi } ] } }\n",
            ),
        ]);

        assert!(analyzer.analyze_workflow_file("release.yml").await.is_ok());
    }

    #[tokio::test]
    async fn unresolved_expression_is_not_flagged() {
        let analyzer = analyzer_for(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./verify.yml, with: { run_tests: \"${{ inputs.flag }}\" } } }\n",
            ),
            (
                "verify.yml",
                "on:\n  workflow_call:\n    inputs:\n      run_tests:\n        type: boolean\n        required: true\njobs: { verify: { runs-on: ubuntu-latest, steps: [ { run: echo hi } ] } }\n",
            ),
        ]);

        assert!(analyzer.analyze_workflow_file("release.yml").await.is_ok());
    }
}
