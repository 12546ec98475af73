//! Typed data models and a schema-validating reader for GitHub Actions
//! workflow and action YAML.
//!
//! This crate is the structural, value-driven half of `ghacheck`: it turns
//! an already-parsed YAML tree into a strongly-typed model while collecting
//! every reachable schema violation as a localized [`error::SchemaError`].
//! It never performs I/O and never resolves `uses:` targets; that's left to
//! `ghacheck-core`.

pub mod action;
pub mod error;
pub mod path;
pub mod value;
pub mod whitelist;
pub mod with_value;
pub mod workflow;

pub use action::{Action, ActionInput, read_action};
pub use error::{NotAMappingError, SchemaError, SchemaObject};
pub use with_value::WithValue;
pub use workflow::{Job, Step, Workflow, read_workflow};
