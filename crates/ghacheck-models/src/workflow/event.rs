//! Parsing and modeling of the `on:` block.

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::error::{SchemaError, SchemaObject};
use crate::path::Path;
use crate::value::{self, is_string_like};
use crate::whitelist;

/// Common attributes shared by every input variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputCommon {
    pub description: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowCallInputType {
    Boolean { default: Option<bool> },
    Number { default: Option<f64> },
    String { default: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowCallInput {
    pub common: InputCommon,
    pub ty: WorkflowCallInputType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowDispatchInputType {
    Boolean { default: Option<bool> },
    Number { default: Option<f64> },
    String { default: Option<String> },
    Choice { options: Vec<String>, default: Option<String> },
    Environment { default: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDispatchInput {
    pub common: InputCommon,
    pub ty: WorkflowDispatchInputType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowCallConfig {
    pub inputs: IndexMap<String, WorkflowCallInput>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowDispatchConfig {
    pub inputs: IndexMap<String, WorkflowDispatchInput>,
}

/// `pull_request` and `push` carry event-specific attributes that this
/// system doesn't validate further (branch/path filters and the like); they
/// are retained verbatim for completeness but never produce schema errors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicEvent {
    pub attributes: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventConfig {
    PullRequest(BasicEvent),
    Push(BasicEvent),
    WorkflowCall(WorkflowCallConfig),
    WorkflowDispatch(WorkflowDispatchConfig),
}

/// The workflow's `on:` block: an ordered set of distinct events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnConfig {
    pub events: Vec<EventConfig>,
}

impl OnConfig {
    pub fn workflow_call(&self) -> Option<&WorkflowCallConfig> {
        self.events.iter().find_map(|e| match e {
            EventConfig::WorkflowCall(c) => Some(c),
            _ => None,
        })
    }

    pub fn workflow_dispatch(&self) -> Option<&WorkflowDispatchConfig> {
        self.events.iter().find_map(|e| match e {
            EventConfig::WorkflowDispatch(c) => Some(c),
            _ => None,
        })
    }

    pub fn has_workflow_call(&self) -> bool {
        self.workflow_call().is_some()
    }
}

/// Parses the top-level `on:` value.
pub fn parse_on(value: &Value, path: &Path, errors: &mut Vec<SchemaError>) -> OnConfig {
    match value {
        Value::Sequence(seq) => {
            let mut on = OnConfig::default();
            for item in seq {
                let Some(name) = value::convert_string_like(item) else {
                    errors.push(SchemaError::new(
                        SchemaObject::Event,
                        path,
                        "Must be an array or map of workflow triggering events",
                    ));
                    continue;
                };
                push_bare_event(&mut on, &name, path, errors);
            }
            on
        }
        Value::Mapping(map) => {
            let mut on = OnConfig::default();
            for (key, event_value) in map {
                let Some(name) = value::convert_string_like(key) else {
                    continue;
                };

                if !whitelist::EVENT_NAMES.contains(&name.as_str()) {
                    errors.push(SchemaError::new(
                        SchemaObject::Event,
                        &path.key(&name),
                        format!("`{name}` is not a valid workflow trigger event name"),
                    ));
                    continue;
                }

                let event_path = path.key(&name);
                let config = match event_value {
                    Value::Null => empty_event(&name),
                    Value::Mapping(_) => parse_event_body(&name, event_value, &event_path, errors),
                    _ => {
                        errors.push(SchemaError::new(
                            SchemaObject::Event,
                            &event_path,
                            format!("`on.{name}` must be a map of event configuration"),
                        ));
                        empty_event(&name)
                    }
                };
                on.events.push(config);
            }
            on
        }
        _ => {
            errors.push(SchemaError::new(
                SchemaObject::Event,
                path,
                "Must be an array or map of workflow triggering events",
            ));
            OnConfig::default()
        }
    }
}

fn push_bare_event(on: &mut OnConfig, name: &str, path: &Path, errors: &mut Vec<SchemaError>) {
    if !whitelist::EVENT_NAMES.contains(&name) {
        errors.push(SchemaError::new(
            SchemaObject::Event,
            &path.key(name),
            format!("`{name}` is not a valid workflow trigger event name"),
        ));
        return;
    }
    on.events.push(empty_event(name));
}

fn empty_event(name: &str) -> EventConfig {
    match name {
        "pull_request" => EventConfig::PullRequest(BasicEvent::default()),
        "push" => EventConfig::Push(BasicEvent::default()),
        "workflow_call" => EventConfig::WorkflowCall(WorkflowCallConfig::default()),
        "workflow_dispatch" => EventConfig::WorkflowDispatch(WorkflowDispatchConfig::default()),
        _ => unreachable!("caller already validated the event name"),
    }
}

fn parse_event_body(
    name: &str,
    value: &Value,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> EventConfig {
    let map = value::as_map(value).expect("caller already matched Value::Mapping");

    match name {
        "pull_request" => EventConfig::PullRequest(BasicEvent {
            attributes: map
                .iter()
                .filter_map(|(k, v)| value::convert_string_like(k).map(|k| (k, v.clone())))
                .collect(),
        }),
        "push" => EventConfig::Push(BasicEvent {
            attributes: map
                .iter()
                .filter_map(|(k, v)| value::convert_string_like(k).map(|k| (k, v.clone())))
                .collect(),
        }),
        "workflow_call" => EventConfig::WorkflowCall(parse_workflow_call(map, path, errors)),
        "workflow_dispatch" => {
            EventConfig::WorkflowDispatch(parse_workflow_dispatch(map, path, errors))
        }
        _ => unreachable!("caller already validated the event name"),
    }
}

fn parse_workflow_call(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> WorkflowCallConfig {
    let mut config = WorkflowCallConfig::default();

    for (key, value) in map {
        let Some(key) = value::convert_string_like(key) else {
            continue;
        };
        if key != "inputs" {
            // `secrets` and `outputs` are accepted but unmodeled at this layer.
            continue;
        }

        let inputs_path = path.key("inputs");
        let Some(inputs_map) = value::as_map(value) else {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &inputs_path,
                "`inputs` must be a map",
            ));
            continue;
        };

        for (input_key, input_value) in inputs_map {
            let Some(id) = value::convert_string_like(input_key) else {
                continue;
            };
            let input_path = inputs_path.key(&id);
            if let Some(input) = parse_workflow_call_input(input_value, &input_path, errors) {
                config.inputs.insert(id, input);
            }
        }
    }

    config
}

fn parse_workflow_dispatch(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> WorkflowDispatchConfig {
    let mut config = WorkflowDispatchConfig::default();

    for (key, value) in map {
        let Some(key) = value::convert_string_like(key) else {
            continue;
        };
        if key != "inputs" {
            continue;
        }

        let inputs_path = path.key("inputs");
        let Some(inputs_map) = value::as_map(value) else {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &inputs_path,
                "`inputs` must be a map",
            ));
            continue;
        };

        for (input_key, input_value) in inputs_map {
            let Some(id) = value::convert_string_like(input_key) else {
                continue;
            };
            let input_path = inputs_path.key(&id);
            if let Some(input) = parse_workflow_dispatch_input(input_value, &input_path, errors) {
                config.inputs.insert(id, input);
            }
        }
    }

    config
}

fn unknown_field_error(
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
        SchemaObject::Input,
        path,
        format!("unrecognized field(s): {}", unknown.join(", ")),
    ));
}

fn parse_input_common(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> InputCommon {
    let description = map
        .get("description")
        .and_then(value::convert_string_like);
    if map.get("description").is_some_and(|v| !is_string_like(v)) {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            &path.key("description"),
            "`description` must be a string",
        ));
    }

    let required = match map.get("required") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("required"),
                "`required` must be a boolean",
            ));
            false
        }
    };

    InputCommon {
        description,
        required,
    }
}

fn parse_workflow_call_input(
    value: &Value,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> Option<WorkflowCallInput> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            path,
            "Input must be a map",
        ));
        return None;
    };

    unknown_field_error(map, whitelist::WORKFLOW_CALL_INPUT_KEYS, path, errors);
    let common = parse_input_common(map, path, errors);

    let Some(type_value) = map.get("type").and_then(value::convert_string_like) else {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            &path.key("type"),
            "`type` is required and must be one of: boolean, number, string",
        ));
        return None;
    };

    let default = map.get("default");
    let ty = match type_value.as_str() {
        "boolean" => WorkflowCallInputType::Boolean {
            default: parse_typed_default(default, path, errors, |v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            }),
        },
        "number" => WorkflowCallInputType::Number {
            default: parse_typed_default(default, path, errors, |v| v.as_f64()),
        },
        "string" => WorkflowCallInputType::String {
            default: parse_typed_default(default, path, errors, value::convert_string_like),
        },
        other => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("type"),
                format!("`{other}` is not a valid workflow_call input type"),
            ));
            return None;
        }
    };

    Some(WorkflowCallInput { common, ty })
}

fn parse_workflow_dispatch_input(
    value: &Value,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> Option<WorkflowDispatchInput> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            path,
            "Input must be a map",
        ));
        return None;
    };

    unknown_field_error(map, whitelist::WORKFLOW_DISPATCH_INPUT_KEYS, path, errors);
    let common = parse_input_common(map, path, errors);

    let Some(type_value) = map.get("type").and_then(value::convert_string_like) else {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            &path.key("type"),
            "`type` is required and must be one of: boolean, number, string, choice, environment",
        ));
        return None;
    };

    let default = map.get("default");
    let ty = match type_value.as_str() {
        "boolean" => WorkflowDispatchInputType::Boolean {
            default: parse_typed_default(default, path, errors, |v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            }),
        },
        "number" => WorkflowDispatchInputType::Number {
            default: parse_typed_default(default, path, errors, |v| v.as_f64()),
        },
        "string" => WorkflowDispatchInputType::String {
            default: parse_typed_default(default, path, errors, value::convert_string_like),
        },
        "environment" => WorkflowDispatchInputType::Environment {
            default: parse_typed_default(default, path, errors, value::convert_string_like),
        },
        "choice" => parse_choice_input(map, path, errors),
        other => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("type"),
                format!("`{other}` is not a valid workflow_dispatch input type"),
            ));
            return None;
        }
    };

    Some(WorkflowDispatchInput { common, ty })
}

fn parse_choice_input(
    map: &serde_yaml::Mapping,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> WorkflowDispatchInputType {
    let options = match map.get("options") {
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("options"),
                "Choice input must have `options`",
            ));
            Vec::new()
        }
        Some(Value::Sequence(seq)) if !seq.is_empty() => {
            seq.iter().filter_map(value::convert_string_like).collect()
        }
        Some(_) => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("options"),
                "`options` must be a non-empty array of strings",
            ));
            Vec::new()
        }
    };

    let default = match map.get("default") {
        None => None,
        Some(v) => match value::convert_string_like(v) {
            Some(s) if options.contains(&s) => Some(s),
            Some(s) => {
                errors.push(SchemaError::new(
                    SchemaObject::Input,
                    &path.key("default"),
                    format!("`{s}` is not an input option"),
                ));
                None
            }
            None => {
                errors.push(SchemaError::new(
                    SchemaObject::Input,
                    &path.key("default"),
                    "`default` must be a string",
                ));
                None
            }
        },
    };

    WorkflowDispatchInputType::Choice { options, default }
}

fn parse_typed_default<T>(
    value: Option<&Value>,
    path: &Path,
    errors: &mut Vec<SchemaError>,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = value?;
    match convert(value) {
        Some(t) => Some(t),
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("default"),
                "`default` does not match the input's declared type",
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> (OnConfig, Vec<SchemaError>) {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        let mut errors = Vec::new();
        let on = parse_on(&value, &Path::root().key("on"), &mut errors);
        (on, errors)
    }

    #[test]
    fn rejects_unknown_event_name() {
        let (_, errors) = parse("issue_comment: {}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("issue_comment"));
        assert_eq!(errors[0].path, "on.issue_comment");
    }

    #[test]
    fn rejects_non_array_non_map() {
        let (_, errors) = parse("push");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Must be an array or map of workflow triggering events"
        );
    }

    #[test]
    fn choice_default_must_be_an_option() {
        let yaml = r#"
workflow_dispatch:
  inputs:
    happy_data:
      type: choice
      options: [Boo, Yaa]
      default: Yah
"#;
        let (_, errors) = parse(yaml);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "`Yah` is not an input option");
        assert_eq!(errors[0].path, "on.workflow_dispatch.inputs.happy_data.default");
    }

    #[test]
    fn choice_without_options_is_an_error() {
        let yaml = r#"
workflow_dispatch:
  inputs:
    target:
      type: choice
"#;
        let (_, errors) = parse(yaml);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Choice input must have `options`");
    }

    #[test]
    fn materializes_null_event_as_empty() {
        let (on, errors) = parse("pull_request:\npush:\n");
        assert!(errors.is_empty());
        assert_eq!(on.events.len(), 2);
    }

    #[test]
    fn workflow_call_input_type_restricted_to_boolean_number_string() {
        let yaml = r#"
workflow_call:
  inputs:
    target:
      type: choice
"#;
        let (_, errors) = parse(yaml);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("choice"));
    }
}
