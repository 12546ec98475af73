//! The YAML adapter (C1) and type predicates (C2).
//!
//! The reader never tokenizes YAML itself; it consumes an already-parsed
//! [`serde_yaml::Value`] tree and narrows it with the predicates below. This
//! keeps the reader's recursive descent uniform regardless of which scalar
//! shape a given YAML author chose (`on: true` vs `on: "true"`, etc).

use serde_yaml::{Mapping, Value};

/// The dynamic kind name used when interpolating into user-facing messages,
/// e.g. "This sequence YAML is simply the opportunity to begin again...".
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

pub fn is_map(value: &Value) -> bool {
    value.is_mapping()
}

pub fn as_map(value: &Value) -> Option<&Mapping> {
    value.as_mapping()
}

pub fn is_sequence(value: &Value) -> bool {
    value.is_sequence()
}

pub fn as_sequence(value: &Value) -> Option<&Vec<Value>> {
    value.as_sequence()
}

/// A scalar of type boolean, number, or string: contextually coercible to a
/// string wherever GitHub Actions expects one.
pub fn is_string_like(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// Stringifies a string-like scalar using the host's shortest canonical
/// representation. Idempotent: re-running this on its own output is a no-op,
/// since the output is always a `Value::String`.
pub fn convert_string_like(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(convert_number(n)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn convert_number(n: &serde_yaml::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(f) = n.as_f64() {
        // `f64`'s `Display` already produces the shortest round-tripping
        // representation, which gives us "no trailing zeros beyond the
        // required decimal" for free.
        f.to_string()
    } else {
        n.to_string()
    }
}

/// Normalizes a scalar-or-sequence-of-string-likes field (e.g. `needs:`)
/// into a `Vec<String>`. Returns `None` if `value` is neither a string-like
/// scalar nor a sequence.
pub fn scalar_or_sequence_of_string_likes(value: &Value) -> Option<Vec<String>> {
    if is_string_like(value) {
        return convert_string_like(value).map(|s| vec![s]);
    }

    as_sequence(value).map(|seq| seq.iter().filter_map(convert_string_like).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringifies_booleans_and_numbers_canonically() {
        assert_eq!(convert_string_like(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(convert_string_like(&Value::Bool(false)).unwrap(), "false");
        assert_eq!(
            convert_string_like(&Value::Number(42.into())).unwrap(),
            "42"
        );
        assert_eq!(
            convert_string_like(&Value::Number((1.5).into())).unwrap(),
            "1.5"
        );
    }

    #[test]
    fn convert_string_like_is_idempotent() {
        for value in [
            Value::Bool(true),
            Value::Number(42.into()),
            Value::Number((3.140).into()),
            Value::String("already a string".into()),
        ] {
            let once = convert_string_like(&value).unwrap();
            let twice = convert_string_like(&Value::String(once.clone())).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn needs_normalizes_scalar_and_sequence() {
        let scalar = Value::String("build".into());
        assert_eq!(
            scalar_or_sequence_of_string_likes(&scalar).unwrap(),
            vec!["build".to_string()]
        );

        let seq = Value::Sequence(vec![
            Value::String("build".into()),
            Value::String("test".into()),
        ]);
        assert_eq!(
            scalar_or_sequence_of_string_likes(&seq).unwrap(),
            vec!["build".to_string(), "test".to_string()]
        );
    }
}
