//! The `ToolPolicy` contract: given a tool call, decide allow or deny.

use std::path::PathBuf;

use super::{fs_scope, shell::ShellCheck, SandboxError};

/// A tool invocation requested by the LLM, as the driver is about to
/// dispatch it.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    /// For the shell tool, the full command line. Unused by other tools.
    pub shell_command: Option<String>,
    /// For file-write tools, the target path.
    pub write_path: Option<PathBuf>,
}

/// The outcome of evaluating a `ToolCall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny { reason: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// Evaluates tool calls against the sandbox's command allow-list and
/// filesystem scope, for a single project directory.
pub struct ToolPolicy {
    project_root: PathBuf,
    init_script_path: String,
}

impl ToolPolicy {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            init_script_path: "./init.sh".to_string(),
        }
    }

    pub fn with_init_script_path(mut self, path: impl Into<String>) -> Self {
        self.init_script_path = path.into();
        self
    }

    /// Evaluate a tool call, returning allow or a deny with reason. Never
    /// panics: a malformed call is just denied.
    pub fn check(&self, call: &ToolCall) -> PolicyDecision {
        match call.name.as_str() {
            "shell" | "bash" | "sh" => self.check_shell(call),
            "write" | "edit" => self.check_write(call),
            _ => PolicyDecision::Allow,
        }
    }

    fn check_shell(&self, call: &ToolCall) -> PolicyDecision {
        let Some(command) = call.shell_command.as_deref() else {
            return PolicyDecision::Deny {
                reason: SandboxError::EmptyCommand.to_string(),
            };
        };
        match ShellCheck::validate(command, &self.init_script_path) {
            Ok(()) => PolicyDecision::Allow,
            Err(reason) => PolicyDecision::Deny {
                reason: reason.to_string(),
            },
        }
    }

    fn check_write(&self, call: &ToolCall) -> PolicyDecision {
        let Some(path) = call.write_path.as_deref() else {
            return PolicyDecision::Allow;
        };

        if fs_scope::path_is_sensitive(path) {
            return PolicyDecision::Deny {
                reason: SandboxError::SensitivePath(path.display().to_string()).to_string(),
            };
        }

        match fs_scope::path_is_within_project(path, &self.project_root) {
            Ok(true) => PolicyDecision::Allow,
            Ok(false) => PolicyDecision::Deny {
                reason: SandboxError::WritePathEscapesProject(path.display().to_string()).to_string(),
            },
            Err(err) => PolicyDecision::Deny {
                reason: format!("failed to resolve write path: {err}"),
            },
        }
    }
}
