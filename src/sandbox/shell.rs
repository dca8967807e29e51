//! Shell-command allow-list and per-binary shape checks.

use super::SandboxError;

/// First-token binaries the sandbox will run at all. Grouped by the
/// categories named in the design: file-listing, file-read, file-copy/mkdir,
/// permission-set, package manager, interpreter, type-checker, test-runner,
/// version-control, process-inspection, sleep, process-kill, and the
/// project-local init script.
const ALLOWED_BINARIES: &[&str] = &[
    // file-listing
    "ls", "find",
    // file-read
    "cat", "head", "tail", "wc", "grep",
    // file-copy / mkdir
    "cp", "mkdir",
    // permission-set
    "chmod",
    // package manager
    "cargo", "npm", "pnpm", "yarn", "pip", "pip3",
    // interpreter
    "python", "python3", "node", "ruby",
    // type-checker
    "tsc", "mypy", "pyright",
    // test-runner
    "pytest", "jest", "vitest",
    // version control
    "git",
    // process-inspection
    "ps",
    // sleep
    "sleep",
    // process-kill
    "kill", "pkill",
    // project-init-script
    "./init.sh",
];

/// `true` iff `binary` (the shell command's first whitespace-separated
/// token) is in the allow-list.
pub fn is_allowed_binary(binary: &str) -> bool {
    ALLOWED_BINARIES.contains(&binary)
}

/// Dev-process name patterns that `kill`/`pkill` may target. Anything not
/// matching one of these is denied, since an unscoped kill could take down
/// something outside the sandboxed session.
const KILLABLE_PATTERNS: &[&str] = &["node", "vite", "webpack", "cargo", "pytest", "jest", "npm run"];

/// Result of validating a parsed shell command against the allow-list and
/// the per-binary shape rules.
pub struct ShellCheck;

impl ShellCheck {
    /// Validate a raw shell command line. Returns `Ok(())` when the command
    /// may proceed, or the `SandboxError` reason for denial.
    pub fn validate(command_line: &str, init_script_path: &str) -> Result<(), SandboxError> {
        let trimmed = command_line.trim();
        let mut tokens = trimmed.split_whitespace();
        let binary = tokens.next().ok_or(SandboxError::EmptyCommand)?;

        if !is_allowed_binary(binary) {
            return Err(SandboxError::BinaryNotAllowed(binary.to_string()));
        }

        match binary {
            "kill" | "pkill" => {
                let target = tokens.collect::<Vec<_>>().join(" ");
                let matches = KILLABLE_PATTERNS
                    .iter()
                    .any(|pattern| target.contains(pattern));
                if !matches {
                    return Err(SandboxError::KillTargetNotAllowed(target));
                }
            }
            "chmod" => {
                let mode = tokens.next().unwrap_or_default();
                if !matches!(mode, "+x" | "u+x" | "a+x" | "755" | "744") {
                    return Err(SandboxError::PermissionModeNotAllowed(mode.to_string()));
                }
            }
            "./init.sh" => {
                if trimmed != init_script_path && binary != init_script_path {
                    return Err(SandboxError::InitScriptPathNotAllowed(trimmed.to_string()));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denies_binary_not_in_allow_list() {
        let err = ShellCheck::validate("rm -rf /", "./init.sh").unwrap_err();
        assert_eq!(err, SandboxError::BinaryNotAllowed("rm".to_string()));
    }

    #[test]
    fn allows_known_binaries() {
        assert!(ShellCheck::validate("git status", "./init.sh").is_ok());
        assert!(ShellCheck::validate("cargo test", "./init.sh").is_ok());
    }

    #[test]
    fn kill_requires_known_dev_process_pattern() {
        assert!(ShellCheck::validate("pkill -f vite", "./init.sh").is_ok());
        assert!(ShellCheck::validate("kill -9 1", "./init.sh").is_err());
    }

    #[test]
    fn chmod_only_accepts_make_executable() {
        assert!(ShellCheck::validate("chmod +x script.sh", "./init.sh").is_ok());
        assert!(ShellCheck::validate("chmod 600 secrets.env", "./init.sh").is_err());
    }

    #[test]
    fn init_script_must_match_project_local_path() {
        assert!(ShellCheck::validate("./init.sh", "./init.sh").is_ok());
        assert!(ShellCheck::validate("./other.sh", "./init.sh").is_err());
    }
}
