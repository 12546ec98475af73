//! The schema error model shared by the workflow and action readers.

use std::fmt;

use crate::path::Path;

/// The class of object a [`SchemaError`] was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaObject {
    Workflow,
    Event,
    Job,
    Input,
    Step,
    Action,
    Output,
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Workflow => "workflow",
            Self::Event => "event",
            Self::Job => "job",
            Self::Input => "input",
            Self::Step => "step",
            Self::Action => "action",
            Self::Output => "output",
        };
        write!(f, "{s}")
    }
}

/// A single, localized schema violation.
///
/// `path` follows the dotted/bracketed convention produced by [`Path`]; it
/// resolves against the original YAML tree to either the erroneous node or,
/// when that node is missing entirely, its immediate parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub object: SchemaObject,
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(object: SchemaObject, path: &Path, message: impl Into<String>) -> Self {
        Self {
            object,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{message} ({path})", message = self.message, path = self.path)
    }
}

/// Raised only when the reader cannot make sense of the document at all,
/// i.e. the root isn't a mapping. Every other schema violation is reported
/// through [`SchemaError`] instead of aborting the read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "This {kind} YAML is simply the opportunity to begin again, this time with a valid workflow YAML"
)]
pub struct NotAMappingError {
    pub kind: &'static str,
}
