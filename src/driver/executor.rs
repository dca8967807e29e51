//! Dispatches a single tool call to its concrete effect, after the Sandbox
//! layer has already allowed it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::Glob;
use tokio::process::Command;
use walkdir::WalkDir;

use super::events::ToolUse;

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_use: &ToolUse, project_root: &Path) -> String;
}

/// Executes file and shell tools directly against the filesystem and a
/// subprocess, respectively. Tracker/retrieval tools are dispatched by the
/// driver itself before reaching this executor, since they need access to
/// shared clients the executor does not own.
pub struct FsShellExecutor;

#[async_trait]
impl ToolExecutor for FsShellExecutor {
    async fn execute(&self, tool_use: &ToolUse, project_root: &Path) -> String {
        match tool_use.name.as_str() {
            "read" => {
                let Some(path) = resolve_path(tool_use, project_root) else {
                    return "error: missing path".to_string();
                };
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(e) => format!("error: {e}"),
                }
            }
            "write" => {
                let Some(path) = resolve_path(tool_use, project_root) else {
                    return "error: missing path".to_string();
                };
                let content = tool_use.input.get("content").and_then(|c| c.as_str()).unwrap_or_default();
                if let Some(parent) = path.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        return format!("error: {e}");
                    }
                }
                match tokio::fs::write(&path, content).await {
                    Ok(()) => "ok".to_string(),
                    Err(e) => format!("error: {e}"),
                }
            }
            "edit" => {
                let Some(path) = resolve_path(tool_use, project_root) else {
                    return "error: missing path".to_string();
                };
                let old = tool_use.input.get("old").and_then(|v| v.as_str()).unwrap_or_default();
                let new = tool_use.input.get("new").and_then(|v| v.as_str()).unwrap_or_default();
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => {
                        let replaced = content.replacen(old, new, 1);
                        match tokio::fs::write(&path, replaced).await {
                            Ok(()) => "ok".to_string(),
                            Err(e) => format!("error: {e}"),
                        }
                    }
                    Err(e) => format!("error: {e}"),
                }
            }
            "bash" => {
                let command_line = tool_use.input.get("command").and_then(|c| c.as_str()).unwrap_or_default();
                let output = Command::new("sh").arg("-c").arg(command_line).current_dir(project_root).output().await;
                match output {
                    Ok(output) => format!(
                        "{}{}",
                        String::from_utf8_lossy(&output.stdout),
                        String::from_utf8_lossy(&output.stderr)
                    ),
                    Err(e) => format!("error: {e}"),
                }
            }
            "glob" => {
                let Some(pattern) = tool_use.input.get("pattern").and_then(|p| p.as_str()) else {
                    return "error: missing pattern".to_string();
                };
                match glob_project(project_root, pattern) {
                    Ok(matches) => matches.join("\n"),
                    Err(e) => format!("error: {e}"),
                }
            }
            "grep" => {
                let Some(pattern) = tool_use.input.get("pattern").and_then(|p| p.as_str()) else {
                    return "error: missing pattern".to_string();
                };
                match grep_project(project_root, pattern) {
                    Ok(matches) => matches.join("\n"),
                    Err(e) => format!("error: {e}"),
                }
            }
            other => format!("error: unsupported tool {other}"),
        }
    }
}

fn resolve_path(tool_use: &ToolUse, project_root: &Path) -> Option<PathBuf> {
    let raw = tool_use.input.get("path").and_then(|p| p.as_str())?;
    Some(project_root.join(raw))
}

/// Relative paths of every file under `project_root` matching `pattern`.
fn glob_project(project_root: &Path, pattern: &str) -> Result<Vec<String>, String> {
    let matcher = Glob::new(pattern).map_err(|e| e.to_string())?.compile_matcher();
    let mut matches = Vec::new();
    for entry in WalkDir::new(project_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(project_root) else {
            continue;
        };
        if matcher.is_match(relative) {
            matches.push(relative.display().to_string());
        }
    }
    matches.sort();
    Ok(matches)
}

/// `path:line:text` for every line under `project_root` matching `pattern`.
fn grep_project(project_root: &Path, pattern: &str) -> Result<Vec<String>, String> {
    let regex = regex::Regex::new(pattern).map_err(|e| e.to_string())?;
    let mut matches = Vec::new();
    for entry in WalkDir::new(project_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let relative = entry.path().strip_prefix(project_root).unwrap_or(entry.path());
        for (index, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(format!("{}:{}:{}", relative.display(), index + 1, line));
            }
        }
    }
    Ok(matches)
}
