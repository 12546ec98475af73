//! Type-compatibility checks for `workflow_call` inputs (C7) and the
//! `${{ ... }}` elision heuristic used to avoid flagging expression-typed
//! `with:` values.

use std::sync::LazyLock;

use ghacheck_models::WithValue;
use ghacheck_models::workflow::event::WorkflowCallInputType;
use regex::Regex;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{\{.*?\}\}").unwrap());

pub fn scalar_kind(value: &WithValue) -> &'static str {
    match value {
        WithValue::Boolean(_) => "boolean",
        WithValue::Number(_) => "number",
        WithValue::String(_) => "string",
    }
}

pub fn type_name(ty: &WorkflowCallInputType) -> &'static str {
    match ty {
        WorkflowCallInputType::Boolean { .. } => "boolean",
        WorkflowCallInputType::Number { .. } => "number",
        WorkflowCallInputType::String { .. } => "string",
    }
}

pub fn has_default(ty: &WorkflowCallInputType) -> bool {
    match ty {
        WorkflowCallInputType::Boolean { default } => default.is_some(),
        WorkflowCallInputType::Number { default } => default.is_some(),
        WorkflowCallInputType::String { default } => default.is_some(),
    }
}

/// `true` when `value` is a string wholly composed of `${{ ... }}`
/// expressions: its scalar kind can't be determined without an expression
/// parser, so the caller should skip the compatibility check entirely.
pub fn is_unknown_scalar(value: &WithValue) -> bool {
    match value {
        WithValue::String(s) if s.contains("${{") => EXPRESSION.replace_all(s, "").trim().is_empty(),
        _ => false,
    }
}

pub fn is_compatible(ty: &WorkflowCallInputType, value: &WithValue) -> bool {
    match ty {
        WorkflowCallInputType::Boolean { .. } => matches!(value, WithValue::Boolean(_)),
        WorkflowCallInputType::Number { .. } => matches!(value, WithValue::Number(_)),
        WorkflowCallInputType::String { .. } => true,
    }
}
