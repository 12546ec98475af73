//! Step parsing: `run:` vs `uses:` discrimination.

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::error::{SchemaError, SchemaObject};
use crate::path::Path;
use crate::value;
use crate::whitelist;
use crate::with_value::WithValue;

use super::uses::{self, ActionSpecifier};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepCommon {
    pub id: Option<String>,
    pub r#if: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunStep {
    pub common: StepCommon,
    pub run: String,
    pub env: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsesStep {
    pub common: StepCommon,
    pub uses: ActionSpecifier,
    pub with: IndexMap<String, WithValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Run(RunStep),
    Uses(UsesStep),
}

impl Step {
    pub fn common(&self) -> &StepCommon {
        match self {
            Step::Run(r) => &r.common,
            Step::Uses(u) => &u.common,
        }
    }

    /// `id || name || step[<index>]`, used to label runtime errors.
    pub fn label(&self, index: usize) -> String {
        let common = self.common();
        if let Some(id) = &common.id {
            return id.clone();
        }
        if let Some(name) = &common.name {
            return name.clone();
        }
        format!("step[{index}]")
    }
}

static ID_GRAMMAR: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^[_a-z][_\-a-z0-9]+$").unwrap());

pub fn is_valid_id(id: &str) -> bool {
    ID_GRAMMAR.is_match(id)
}

fn parse_env(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> IndexMap<String, String> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Step,
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
                SchemaObject::Step,
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
            SchemaObject::Step,
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
                SchemaObject::Step,
                &path.key(&key),
                "`with` values must be boolean, number, or string",
            )),
        }
    }
    with
}

/// Parses a single entry of `jobs.<id>.steps`.
pub fn parse_step(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> Option<Step> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Step,
            path,
            "Each step must be a map",
        ));
        return None;
    };

    let mut unknown: Vec<String> = map
        .keys()
        .filter_map(value::convert_string_like)
        .filter(|k| !whitelist::STEP_KEYS.contains(&k.as_str()))
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(SchemaError::new(
            SchemaObject::Step,
            path,
            format!("unrecognized field(s): {}", unknown.join(", ")),
        ));
    }

    let id = match map.get("id") {
        None => None,
        Some(v) => match value::convert_string_like(v) {
            Some(id) if is_valid_id(&id) => Some(id),
            Some(id) => {
                errors.push(SchemaError::new(
                    SchemaObject::Step,
                    &path.key("id"),
                    format!("`{id}` is not a valid step id"),
                ));
                None
            }
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Step,
                    &path.key("id"),
                    "`id` must be a string",
                ));
                None
            }
        },
    };

    let r#if = match map.get("if") {
        None => None,
        Some(v) => string_like_field(v, &path.key("if"), "if", errors),
    };
    let name = match map.get("name") {
        None => None,
        Some(v) => string_like_field(v, &path.key("name"), "name", errors),
    };

    let common = StepCommon { id, r#if, name };

    let has_run = map.contains_key("run");
    let has_uses = map.contains_key("uses");

    match (has_run, has_uses) {
        (true, true) => {
            errors.push(SchemaError::new(
                SchemaObject::Step,
                path,
                "A step cannot define both `run` and `uses`",
            ));
            None
        }
        (false, false) => {
            errors.push(SchemaError::new(
                SchemaObject::Step,
                path,
                "A step must define either `run` or `uses`",
            ));
            None
        }
        (true, false) => {
            let run = match map.get("run").and_then(value::convert_string_like) {
                Some(run) => run,
                None => {
                    errors.push(SchemaError::new(
                        SchemaObject::Step,
                        &path.key("run"),
                        "`run` must be a string",
                    ));
                    return None;
                }
            };
            let env = match map.get("env") {
                Some(v) => parse_env(v, &path.key("env"), errors),
                None => IndexMap::new(),
            };
            Some(Step::Run(RunStep { common, run, env }))
        }
        (false, true) => {
            if map.contains_key("env") {
                errors.push(SchemaError::new(
                    SchemaObject::Step,
                    &path.key("env"),
                    "`env` is not supported on a step with `uses`",
                ));
            }

            let raw = match map.get("uses").and_then(value::convert_string_like) {
                Some(raw) => raw,
                None => {
                    errors.push(SchemaError::new(
                        SchemaObject::Step,
                        &path.key("uses"),
                        "`uses` must be a string",
                    ));
                    return None;
                }
            };

            let uses_path = path.key("uses");
            let uses = match uses::parse_action_specifier(&raw) {
                Ok(uses) => uses,
                Err(message) => {
                    errors.push(SchemaError::new(SchemaObject::Step, &uses_path, message));
                    return None;
                }
            };

            let with = match map.get("with") {
                Some(v) => parse_with(v, &path.key("with"), errors),
                None => IndexMap::new(),
            };

            Some(Step::Uses(UsesStep { common, uses, with }))
        }
    }
}

fn string_like_field(
    value: &Value,
    path: &Path,
    field: &str,
    errors: &mut Vec<SchemaError>,
) -> Option<String> {
    match value::convert_string_like(value) {
        Some(s) => Some(s),
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Step,
                path,
                format!("`{field}` must be a string"),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> (Option<Step>, Vec<SchemaError>) {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        let mut errors = Vec::new();
        let step = parse_step(&value, &Path::root(), &mut errors);
        (step, errors)
    }

    #[test]
    fn run_step_parses() {
        let (step, errors) = parse("run: echo hi\nenv:\n  FOO: bar\n");
        assert!(errors.is_empty());
        let Some(Step::Run(run)) = step else {
            panic!("expected a run step");
        };
        assert_eq!(run.run, "echo hi");
        assert_eq!(run.env.get("FOO").unwrap(), "bar");
    }

    #[test]
    fn uses_step_rejects_env() {
        let (_, errors) = parse("uses: actions/checkout@v4\nenv:\n  FOO: bar\n");
        assert!(
            errors
                .iter()
                .any(|e| e.message.contains("not supported on a step with `uses`"))
        );
    }

    #[test]
    fn run_and_uses_mutually_exclusive() {
        let (step, errors) = parse("run: echo hi\nuses: actions/checkout@v4\n");
        assert!(step.is_none());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot define both"));
    }

    #[test]
    fn neither_run_nor_uses_is_an_error() {
        let (step, errors) = parse("name: nothing to do\n");
        assert!(step.is_none());
        assert_eq!(errors.len(), 1);
    }
}
