//! The `uses:` specifier grammars (bit-exact per the workflow-call and
//! action grammars).

use regex::Regex;
use std::sync::LazyLock;

/// A parsed `uses:` value on a job (a callable-workflow reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCallSpecifier {
    Filesystem {
        path: String,
    },
    Repository {
        owner: String,
        repo: String,
        filename: String,
        r#ref: String,
        /// The raw, as-written specifier, for diagnostics and cache keys.
        raw: String,
    },
}

/// A parsed `uses:` value on a step (an action reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSpecifier {
    Docker {
        uri: String,
    },
    Filesystem {
        path: String,
    },
    Repository {
        owner: String,
        repo: String,
        subdirectory: Option<String>,
        r#ref: String,
        raw: String,
    },
}

impl ActionSpecifier {
    /// A short, user-facing rendering, e.g. `eighty4/l3/setup@v3`.
    pub fn display(&self) -> String {
        match self {
            ActionSpecifier::Docker { uri } => uri.clone(),
            ActionSpecifier::Filesystem { path } => path.clone(),
            ActionSpecifier::Repository { raw, .. } => raw.clone(),
        }
    }
}

fn is_relative_path(value: &str) -> bool {
    value.starts_with("./") || value.starts_with("../")
}

static YAML_EXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ya?ml$").unwrap());

/// Parses a job's `uses:` value into a [`WorkflowCallSpecifier`].
///
/// Returns `Err(message)` with the exact diagnostic text to attach at the
/// `uses` path.
pub fn parse_workflow_call_specifier(raw: &str) -> Result<WorkflowCallSpecifier, String> {
    if is_relative_path(raw) {
        return Ok(WorkflowCallSpecifier::Filesystem { path: raw.into() });
    }

    let (head, r#ref) = match raw.split_once('@') {
        Some((head, r#ref)) if !r#ref.is_empty() => (head, r#ref),
        _ => {
            return Err(format!(
                "Must specify GitHub workflow ref in format `{raw}@{{ref}}`"
            ));
        }
    };

    let segments: Vec<&str> = head.split('/').collect();
    if segments.len() != 5 || segments[2] != ".github" || segments[3] != "workflows" {
        return Err(format!(
            "Must specify GitHub workflow ref in format `{raw}@{{ref}}`"
        ));
    }

    let filename = segments[4];
    if !YAML_EXT.is_match(filename) {
        return Err(format!(
            "Must specify GitHub workflow ref in format `{raw}@{{ref}}`"
        ));
    }

    Ok(WorkflowCallSpecifier::Repository {
        owner: segments[0].into(),
        repo: segments[1].into(),
        filename: filename.into(),
        r#ref: r#ref.into(),
        raw: raw.into(),
    })
}

/// Parses a step's `uses:` value into an [`ActionSpecifier`].
pub fn parse_action_specifier(raw: &str) -> Result<ActionSpecifier, String> {
    if let Some(uri) = raw.strip_prefix("docker://") {
        return Ok(ActionSpecifier::Docker { uri: uri.into() });
    }

    if is_relative_path(raw) {
        return Ok(ActionSpecifier::Filesystem { path: raw.into() });
    }

    let (head, r#ref) = match raw.split_once('@') {
        Some((head, r#ref)) if !r#ref.is_empty() => (head, r#ref),
        _ => return Err(format!("Must specify action ref in format `{raw}@{{ref}}`")),
    };

    let segments: Vec<&str> = head.split('/').collect();
    if segments.len() < 2 || segments[0].is_empty() || segments[1].is_empty() {
        return Err(format!("Must specify action ref in format `{raw}@{{ref}}`"));
    }

    let subdirectory = if segments.len() > 2 {
        Some(segments[2..].join("/"))
    } else {
        None
    };

    Ok(ActionSpecifier::Repository {
        owner: segments[0].into(),
        repo: segments[1].into(),
        subdirectory,
        r#ref: r#ref.into(),
        raw: raw.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filesystem_workflow_call() {
        let spec = parse_workflow_call_specifier("./.github/workflows/verify.yml").unwrap();
        assert_eq!(
            spec,
            WorkflowCallSpecifier::Filesystem {
                path: "./.github/workflows/verify.yml".into()
            }
        );
    }

    #[test]
    fn parses_repository_workflow_call() {
        let spec =
            parse_workflow_call_specifier("octo/repo/.github/workflows/ci.yaml@v1").unwrap();
        assert_eq!(
            spec,
            WorkflowCallSpecifier::Repository {
                owner: "octo".into(),
                repo: "repo".into(),
                filename: "ci.yaml".into(),
                r#ref: "v1".into(),
                raw: "octo/repo/.github/workflows/ci.yaml@v1".into(),
            }
        );
    }

    #[test]
    fn rejects_missing_ref() {
        assert!(parse_workflow_call_specifier("octo/repo/.github/workflows/ci.yaml").is_err());
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(parse_workflow_call_specifier("octo/repo/ci.yaml@v1").is_err());
    }

    #[test]
    fn parses_docker_action() {
        assert_eq!(
            parse_action_specifier("docker://alpine:3.18").unwrap(),
            ActionSpecifier::Docker {
                uri: "alpine:3.18".into()
            }
        );
    }

    #[test]
    fn parses_repository_action_with_subdirectory() {
        let spec = parse_action_specifier("eighty4/l3/setup@v3").unwrap();
        assert_eq!(
            spec,
            ActionSpecifier::Repository {
                owner: "eighty4".into(),
                repo: "l3".into(),
                subdirectory: Some("setup".into()),
                r#ref: "v3".into(),
                raw: "eighty4/l3/setup@v3".into(),
            }
        );
    }

    #[test]
    fn parses_repository_action_without_subdirectory() {
        let spec = parse_action_specifier("actions/checkout@v4").unwrap();
        assert_eq!(
            spec,
            ActionSpecifier::Repository {
                owner: "actions".into(),
                repo: "checkout".into(),
                subdirectory: None,
                r#ref: "v4".into(),
                raw: "actions/checkout@v4".into(),
            }
        );
    }
}
