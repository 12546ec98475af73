//! The action reader (C3): models only the `inputs` section of an
//! `action.yml`/`action.yaml` document, per the spec's deliberate
//! under-modeling of composite-action internals.

use indexmap::IndexMap;

use crate::error::{NotAMappingError, SchemaError, SchemaObject};
use crate::path::Path;
use crate::value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionInput {
    pub description: String,
    pub required: bool,
    pub default: Option<String>,
    pub deprecation_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    pub inputs: IndexMap<String, ActionInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadActionResult {
    pub action: Action,
    pub errors: Vec<SchemaError>,
}

pub fn read_action(yaml: &str) -> Result<ReadActionResult, NotAMappingError> {
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
    let inputs_path = path.key("inputs");

    let inputs = match map.get("inputs") {
        None => IndexMap::new(),
        Some(serde_yaml::Value::Mapping(inputs_map)) => {
            let mut inputs = IndexMap::new();
            for (key, value) in inputs_map {
                let Some(id) = value::convert_string_like(key) else {
                    continue;
                };
                let input_path = inputs_path.key(&id);
                if let Some(input) = parse_action_input(value, &input_path, &mut errors) {
                    inputs.insert(id, input);
                }
            }
            inputs
        }
        Some(_) => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &inputs_path,
                "`inputs` must be a map",
            ));
            IndexMap::new()
        }
    };

    Ok(ReadActionResult {
        action: Action { inputs },
        errors,
    })
}

fn parse_action_input(
    value: &serde_yaml::Value,
    path: &Path,
    errors: &mut Vec<SchemaError>,
) -> Option<ActionInput> {
    let Some(map) = value::as_map(value) else {
        errors.push(SchemaError::new(
            SchemaObject::Input,
            path,
            "Each action input must be a map",
        ));
        return None;
    };

    let description = match map.get("description").and_then(value::convert_string_like) {
        Some(d) => d,
        None => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("description"),
                "`description` is required and must be a string",
            ));
            String::new()
        }
    };

    let required = match map.get("required") {
        None => false,
        Some(serde_yaml::Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(SchemaError::new(
                SchemaObject::Input,
                &path.key("required"),
                "`required` must be a boolean",
            ));
            false
        }
    };

    let default = match map.get("default") {
        None | Some(serde_yaml::Value::Null) => None,
        Some(v) => match value::convert_string_like(v) {
            Some(d) => Some(d),
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

    let deprecation_message = map
        .get("deprecationMessage")
        .and_then(value::convert_string_like);

    Some(ActionInput {
        description,
        required,
        default,
        deprecation_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_map_root_is_a_domain_error() {
        let err = read_action("42").unwrap_err();
        assert_eq!(err.kind, "number");
    }

    #[test]
    fn required_input_without_default() {
        let yaml = r#"
inputs:
  must_set:
    description: mandatory
    required: true
"#;
        let result = read_action(yaml).unwrap();
        assert!(result.errors.is_empty());
        let input = result.action.inputs.get("must_set").unwrap();
        assert!(input.required);
        assert!(input.default.is_none());
    }

    #[test]
    fn missing_description_is_an_error() {
        let yaml = "inputs:\n  foo:\n    required: true\n";
        let result = read_action(yaml).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("description"));
    }

    #[test]
    fn other_top_level_keys_are_tolerated() {
        let yaml = "name: my action\nruns:\n  using: node20\n  main: index.js\n";
        let result = read_action(yaml).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.action.inputs.is_empty());
    }
}
