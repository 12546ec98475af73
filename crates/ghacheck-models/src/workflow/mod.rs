//! The workflow reader (C4): converts a parsed YAML tree into a [`Workflow`]
//! while accumulating every [`SchemaError`] reachable in the document.

pub mod event;
pub mod job;
pub mod step;
pub mod uses;

use indexmap::IndexMap;

use crate::error::{NotAMappingError, SchemaError, SchemaObject};
use crate::path::Path;
use crate::value;
use crate::whitelist;

pub use event::{EventConfig, OnConfig, WorkflowCallConfig, WorkflowDispatchConfig};
pub use job::Job;
pub use step::Step;
pub use uses::{ActionSpecifier, WorkflowCallSpecifier};

/// The full, in-memory model of a workflow YAML document.
///
/// `path` is populated by the caller once a successful filesystem read has
/// taken place; it is `None` for a workflow parsed directly from a string
/// (e.g. one fetched from a remote repository, where the reader has no
/// notion of a local path).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workflow {
    pub path: Option<String>,
    pub on: OnConfig,
    pub jobs: IndexMap<String, Job>,
}

/// The result of a workflow read: a best-effort model, plus every schema
/// error found along the way. `errors` is empty iff no schema rule was
/// violated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadWorkflowResult {
    pub workflow: Workflow,
    pub errors: Vec<SchemaError>,
}

/// Parses a workflow document from its already-parsed YAML tree.
///
/// Returns `Err` only when the root isn't a mapping; every other violation
/// is reported through the returned error list instead.
pub fn read_workflow(yaml: &str) -> Result<ReadWorkflowResult, NotAMappingError> {
    let root: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|_| NotAMappingError {
        kind: "unparseable",
    })?;

    let Some(map) = value::as_map(&root) else {
        return Err(NotAMappingError {
            kind: value::kind_name(&root),
        });
    };

    let mut errors = Vec::new();
    let path = Path::root();

    let unknown: Vec<String> = {
        let mut unknown: Vec<String> = map
            .keys()
            .filter_map(value::convert_string_like)
            .filter(|k| !whitelist::WORKFLOW_KEYS.contains(&k.as_str()))
            .collect();
        unknown.sort();
        unknown
    };
    if !unknown.is_empty() {
        errors.push(SchemaError::new(
            SchemaObject::Workflow,
            &path,
            format!("unrecognized field(s): {}", unknown.join(", ")),
        ));
    }

    let on = match map.get("on") {
        Some(v) => event::parse_on(v, &path.key("on"), &mut errors),
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Workflow,
                &path,
                "`on` is required",
            ));
            OnConfig::default()
        }
    };

    let jobs_path = path.key("jobs");
    let jobs = match map.get("jobs") {
        Some(serde_yaml::Value::Mapping(jobs_map)) if !jobs_map.is_empty() => {
            let mut jobs = IndexMap::new();
            for (key, value) in jobs_map {
                let Some(id) = value::convert_string_like(key) else {
                    continue;
                };
                let job_path = jobs_path.key(&id);
                if let Some(job) = job::parse_job(&id, value, &job_path, &mut errors) {
                    jobs.insert(id, job);
                }
            }
            jobs
        }
        Some(serde_yaml::Value::Mapping(_)) => {
            errors.push(SchemaError::new(
                SchemaObject::Workflow,
                &jobs_path,
                "No jobs defined in `jobs`",
            ));
            IndexMap::new()
        }
        _ => {
            errors.push(SchemaError::new(
                SchemaObject::Workflow,
                &jobs_path,
                "`jobs` is required and must be a non-empty map",
            ));
            IndexMap::new()
        }
    };

    Ok(ReadWorkflowResult {
        workflow: Workflow {
            path: None,
            on,
            jobs,
        },
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_map_root_is_a_domain_error() {
        let err = read_workflow("- just\n- a\n- sequence\n").unwrap_err();
        assert_eq!(err.kind, "sequence");
        assert!(err.to_string().contains("sequence YAML"));
    }

    #[test]
    fn empty_jobs_is_a_schema_error() {
        let yaml = "on: push\njobs: {}\n";
        let result = read_workflow(yaml).unwrap();
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.message == "No jobs defined in `jobs`" && e.path == "jobs")
        );
    }

    #[test]
    fn valid_workflow_has_no_errors() {
        let yaml = r#"
on: [push, pull_request]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo hello
"#;
        let result = read_workflow(yaml).unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(result.workflow.jobs.len(), 1);
    }

    #[test]
    fn scenario_s1_missing_workflow_call() {
        let yaml = r#"
on: { workflow_dispatch: }
jobs: { verify: { uses: ./.github/workflows/verify.yml } }
"#;
        let result = read_workflow(yaml).unwrap();
        assert!(result.errors.is_empty());
        let Some(Job::Uses(job)) = result.workflow.jobs.get("verify") else {
            panic!("expected a uses job");
        };
        assert_eq!(
            job.uses,
            WorkflowCallSpecifier::Filesystem {
                path: "./.github/workflows/verify.yml".into()
            }
        );
    }
}
