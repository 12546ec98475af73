//! Job parsing: steps-kind vs uses-kind discrimination, `runs-on`, `env`.

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

use crate::error::{SchemaError, SchemaObject};
use crate::path::Path;
use crate::value;
use crate::whitelist;
use crate::with_value::WithValue;

use super::step::{self, Step};
use super::uses::{self, WorkflowCallSpecifier};

static JOB_ID_GRAMMAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_a-z][_\-a-z0-9]+$").unwrap());

pub fn is_valid_job_id(id: &str) -> bool {
    JOB_ID_GRAMMAR.is_match(id)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
    Group { group: String, labels: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobCommon {
    pub r#if: Option<String>,
    pub name: Option<String>,
    pub needs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepsJob {
    pub common: JobCommon,
    pub runs_on: RunsOn,
    pub env: IndexMap<String, String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsesJob {
    pub common: JobCommon,
    pub uses: WorkflowCallSpecifier,
    pub with: IndexMap<String, WithValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Steps(StepsJob),
    Uses(UsesJob),
}

impl Job {
    pub fn common(&self) -> &JobCommon {
        match self {
            Job::Steps(j) => &j.common,
            Job::Uses(j) => &j.common,
        }
    }
}

fn parse_common(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> JobCommon {
    let r#if = map.get("if").and_then(|v| string_like_or_error(v, &path.key("if"), "if", errors));
    let name = map
        .get("name")
        .and_then(|v| string_like_or_error(v, &path.key("name"), "name", errors));

    let needs = match map.get("needs") {
        None => Vec::new(),
        Some(v) => match value::scalar_or_sequence_of_string_likes(v) {
            Some(needs) => needs,
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    &path.key("needs"),
                    "`needs` must be a string or an array of strings",
                ));
                Vec::new()
            }
        },
    };

    JobCommon { r#if, name, needs }
}

fn string_like_or_error(
    value: &Value,
    path: &Path,
    field: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<String> {
    match value::convert_string_like(value) {
        Some(s) => Some(s),
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Job,
                path,
                format!("`{field}` must be a string"),
            ));
            None
        }
    }
}

fn parse_env(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> IndexMap<String, String> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Job,
            path,
            "`env` must be a map of string-like values",
        ));
        return IndexMap::new();
    };

    let mut env = IndexMap::new();
    for (k, v) in map {
        let Some(key) = value::convert_string_like(k) else {
            continue;
        };
        match value::convert_string_like(v) {
            Some(s) => {
                env.insert(key, s);
            }
            None => errors.push(SchemaError::new(
                SchemaObject::Job,
                &path.key(&key),
                "`env` values must be string-like",
            )),
        }
    }
    env
}

fn parse_with(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> IndexMap<String, WithValue> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Job,
            path,
            "`with` must be a map of string-like values",
        ));
        return IndexMap::new();
    };

    let mut with = IndexMap::new();
    for (k, v) in map {
        let Some(key) = value::convert_string_like(k) else {
            continue;
        };
        match WithValue::from_yaml(v) {
            Some(value) => {
                with.insert(key, value);
            }
            None => errors.push(SchemaError::new(
                SchemaObject::Job,
                &path.key(&key),
                "`with` values must be boolean, number, or string",
            )),
        }
    }
    with
}

fn parse_runs_on(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> Option<RunsOn> {
    if let Some(label) = value::convert_string_like(value) {
        return Some(RunsOn::Label(label));
    }

    if let Some(seq) = value::as_sequence(value) {
        if seq.is_empty() {
            errors.push(SchemaError::new(
                SchemaObject::Job,
                path,
                "`runs-on` array must not be empty",
            ));
            return None;
        }
        return Some(RunsOn::Labels(
            seq.iter().filter_map(value::convert_string_like).collect(),
        ));
    }

    if let Some(map) = value::as_map(value) {
        let group = map.get("group").and_then(value::convert_string_like);
        let labels = match map.get("labels") {
            Some(v) => value::scalar_or_sequence_of_string_likes(v).unwrap_or_default(),
            None => Vec::new(),
        };

        return match group {
            Some(group) => Some(RunsOn::Group { group, labels }),
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    path,
                    "`runs-on` object must define `group`",
                ));
                None
            }
        };
    }

    errors.push(SchemaError::new(
        SchemaObject::Job,
        path,
        "`runs-on` must be a string, an array of strings, or a `{group, labels}` object",
    ));
    None
}

fn check_whitelist(
    map: &serde_yaml::Mapping,
    allowed: &[&str],
    path: &Path,
    errors: &mut Vec<SchemaError>,
) {
    let mut unknown: Vec<String> = map
        .keys()
        .filter_map(value::convert_string_like)
        .filter(|k| !allowed.contains(&k.as_str()))
        .collect();
    if unknown.is_empty() {
        return;
    }
    unknown.sort();
    errors.push(SchemaError::new(
        SchemaObject::Job,
        path,
        format!("unrecognized field(s): {}", unknown.join(", ")),
    ));
}

/// Presence-only checking for `defaults`, `container`, `services`, and
/// `strategy`: these collections are whitelisted but not otherwise modeled.
fn check_ambient_collections(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) {
    if let Some(Value::Mapping(defaults)) = map.get("defaults") {
        check_whitelist(defaults, whitelist::DEFAULTS_KEYS, &path.key("defaults"), errors);
        if let Some(Value::Mapping(run)) = defaults.get("run") {
            check_whitelist(
                run,
                whitelist::DEFAULTS_RUN_KEYS,
                &path.key("defaults").key("run"),
                errors,
            );
        }
    }

    if let Some(Value::Mapping(container)) = map.get("container") {
        check_whitelist(
            container,
            whitelist::CONTAINER_KEYS,
            &path.key("container"),
            errors,
        );
    }

    if let Some(Value::Mapping(services)) = map.get("services") {
        for (name, service) in services {
            let Some(name) = value::convert_string_like(name) else {
                continue;
            };
            if let Value::Mapping(service) = service {
                check_whitelist(
                    service,
                    whitelist::SERVICE_KEYS,
                    &path.key("services").key(&name),
                    errors,
                );
            }
        }
    }

    if let Some(Value::Mapping(strategy)) = map.get("strategy") {
        check_whitelist(strategy, whitelist::STRATEGY_KEYS, &path.key("strategy"), errors);
    }
}

/// Parses a single entry of `jobs`.
pub fn parse_job(id: &str, value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> Option<Job> {
    if !is_valid_job_id(id) {
        errors.push(SchemaError::new(
            SchemaObject::Job,
            &path.parent(),
            format!("`{id}` is not a valid job id"),
        ));
        return None;
    }

    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Job,
            path,
            "Each job must be a map",
        ));
        return None;
    };

    let has_steps = map.contains_key("steps");
    let has_uses = map.contains_key("uses");

    if has_steps && has_uses {
        errors.push(SchemaError::new(
            SchemaObject::Job,
            path,
            "A job cannot define both `steps` and `uses`",
        ));
        return None;
    }

    check_whitelist(
        map,
        if has_uses {
            whitelist::USES_JOB_KEYS
        } else {
            whitelist::STEPS_JOB_KEYS
        },
        path,
        errors,
    );
    check_ambient_collections(map, path, errors);

    let common = parse_common(map, path, errors);

    if has_uses {
        if map.contains_key("env") {
            errors.push(SchemaError::new(
                SchemaObject::Job,
                &path.key("env"),
                "`env` is not supported on a job with `uses`",
            ));
        }

        let raw = match map.get("uses").and_then(value::convert_string_like) {
            Some(raw) => raw,
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    &path.key("uses"),
                    "`uses` must be a string",
                ));
                return None;
            }
        };

        let uses = match uses::parse_workflow_call_specifier(&raw) {
            Ok(uses) => uses,
            Err(message) => {
                errors.push(SchemaError::new(SchemaObject::Job, &path.key("uses"), message));
                return None;
            }
        };

        let with = match map.get("with") {
            Some(v) => parse_with(v, &path.key("with"), errors),
            None => IndexMap::new(),
        };

        return Some(Job::Uses(UsesJob { common, uses, with }));
    }

    if has_steps {
        let runs_on = match map.get("runs-on") {
            Some(v) => parse_runs_on(v, &path.key("runs-on"), errors),
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    path,
                    "A job with `steps` must define `runs-on`",
                ));
                None
            }
        };

        let Some(runs_on) = runs_on else {
            return None;
        };

        let env = match map.get("env") {
            Some(v) => parse_env(v, &path.key("env"), errors),
            None => IndexMap::new(),
        };

        let steps = match map.get("steps") {
            Some(Value::Sequence(seq)) if !seq.is_empty() => seq
                .iter()
                .enumerate()
                .filter_map(|(i, v)| step::parse_step(v, &path.key("steps").index(i), errors))
                .collect(),
            Some(Value::Sequence(_)) => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    &path.key("steps"),
                    "`steps` must not be empty",
                ));
                return None;
            }
            _ => {
                errors.push(SchemaError::new(
                    SchemaObject::Job,
                    &path.key("steps"),
                    "`steps` must be an array",
                ));
                return None;
            }
        };

        return Some(Job::Steps(StepsJob {
            common,
            runs_on,
            env,
            steps,
        }));
    }

    errors.push(SchemaError::new(
        SchemaObject::Job,
        path,
        "A job must define `steps` or `uses`",
    ));
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> (Option<Job>, Vec<SchemaError>) {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        let mut errors = Vec::new();
        let job = parse_job("build", &value, &Path::root().key("jobs").key("build"), &mut errors);
        (job, errors)
    }

    #[test]
    fn steps_job_requires_runs_on() {
        let (job, errors) = parse("steps:\n  - run: echo hi\n");
        assert!(job.is_none());
        assert!(errors.iter().any(|e| e.message.contains("runs-on")));
    }

    #[test]
    fn steps_and_uses_are_mutually_exclusive() {
        let (job, errors) = parse("steps:\n  - run: echo hi\nuses: ./.github/workflows/x.yml\n");
        assert!(job.is_none());
        assert!(errors.iter().any(|e| e.message.contains("cannot define both")));
    }

    #[test]
    fn rejects_invalid_job_id() {
        let value: Value = serde_yaml::from_str("runs-on: ubuntu-latest\nsteps:\n  - run: ok\n").unwrap();
        let mut errors = Vec::new();
        let job = parse_job("1bad", &value, &Path::root().key("jobs").key("1bad"), &mut errors);
        assert!(job.is_none());
        assert!(errors.iter().any(|e| e.message.contains("not a valid job id")));
    }

    #[test]
    fn uses_job_rejects_env() {
        let (_, errors) = parse("uses: ./.github/workflows/x.yml\nenv:\n  A: b\n");
        assert!(errors.iter().any(|e| e.message.contains("not supported on a job with `uses`")));
    }

    #[test]
    fn runs_on_group_form() {
        let (job, errors) = parse(
            "runs-on:\n  group: my-group\n  labels: [self-hosted, linux]\nsteps:\n  - run: ok\n",
        );
        assert!(errors.is_empty());
        let Some(Job::Steps(job)) = job else { panic!() };
        assert_eq!(
            job.runs_on,
            RunsOn::Group {
                group: "my-group".into(),
                labels: vec!["self-hosted".into(), "linux".into()],
            }
        );
    }
}
