//! Sandbox & Tool-Policy Layer.
//!
//! Enforces that tool invocations made by the LLM driver cannot escape the
//! configured bounds: shell commands are checked against an allow-list,
//! filesystem writes must resolve under the project directory, and a small
//! set of additional shape checks apply to specific binaries (process-kill
//! target pattern, permission-set mode, project-init-script path).
//!
//! Denies are fatal for that one tool call only -- the driver surfaces the
//! reason to the LLM, which may retry with a different tool.

mod fs_scope;
mod policy;
mod shell;

pub use fs_scope::path_is_within_project;
pub use policy::{PolicyDecision, ToolCall, ToolPolicy};
pub use shell::{ShellCheck, is_allowed_binary};

use thiserror::Error;

/// Errors raised while evaluating a tool call against the sandbox policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("binary not in allow-list: {0}")]
    BinaryNotAllowed(String),

    #[error("process-kill target does not match a known dev-process pattern: {0}")]
    KillTargetNotAllowed(String),

    #[error("permission-set mode not allowed, only 'make executable' (+x) is accepted: {0}")]
    PermissionModeNotAllowed(String),

    #[error("project-init-script path must be the project-local init script, got: {0}")]
    InitScriptPathNotAllowed(String),

    #[error("write path escapes the project directory: {0}")]
    WritePathEscapesProject(String),

    #[error("write targets a sensitive path: {0}")]
    SensitivePath(String),

    #[error("empty shell command")]
    EmptyCommand,
}
