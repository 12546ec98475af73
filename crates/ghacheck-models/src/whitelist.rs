//! Fixed key whitelists for collections that are field-checked but not
//! otherwise modeled (`defaults`, `container`, `services`, `strategy`), plus
//! the top-level whitelists for workflows, jobs, and steps.

pub const WORKFLOW_KEYS: &[&str] = &[
    "name", "run-name", "on", "permissions", "env", "defaults", "concurrency", "jobs",
];

pub const JOB_COMMON_KEYS: &[&str] = &["if", "name", "needs"];

pub const STEPS_JOB_KEYS: &[&str] = &[
    "if",
    "name",
    "needs",
    "runs-on",
    "env",
    "steps",
    "permissions",
    "environment",
    "concurrency",
    "outputs",
    "container",
    "services",
    "strategy",
    "defaults",
    "timeout-minutes",
    "continue-on-error",
];

pub const USES_JOB_KEYS: &[&str] = &[
    "if",
    "name",
    "needs",
    "uses",
    "with",
    "env",
    "secrets",
    "permissions",
    "concurrency",
];

pub const STEP_KEYS: &[&str] = &[
    "env",
    "continue-on-error",
    "id",
    "if",
    "name",
    "run",
    "shell",
    "timeout-minutes",
    "uses",
    "with",
    "working-directory",
];

pub const DEFAULTS_KEYS: &[&str] = &["run"];
pub const DEFAULTS_RUN_KEYS: &[&str] = &["shell", "working-directory"];
pub const CONTAINER_KEYS: &[&str] = &["image", "credentials", "env", "ports", "volumes", "options"];
pub const SERVICE_KEYS: &[&str] = CONTAINER_KEYS;
pub const STRATEGY_KEYS: &[&str] = &["matrix", "fail-fast", "max-parallel"];

pub const WORKFLOW_CALL_INPUT_KEYS: &[&str] = &["default", "description", "required", "type"];
pub const WORKFLOW_DISPATCH_INPUT_KEYS: &[&str] =
    &["default", "description", "options", "required", "type"];

pub const EVENT_NAMES: &[&str] = &["pull_request", "push", "workflow_call", "workflow_dispatch"];
