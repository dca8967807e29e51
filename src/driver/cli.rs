//! Builds and runs the LLM CLI subprocess, grounded on the teacher's
//! `claude --print --output-format stream-json` invocation shape.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::{events::AgentEvent, DriverError};

/// Model identifier and CLI binary name, configurable per run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub binary: String,
    pub model: String,
    pub allowed_tools: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            binary: "claude".to_string(),
            model: "sonnet".to_string(),
            allowed_tools: "Read,Write,Edit,Bash,Glob,Grep".to_string(),
        }
    }
}

/// Spawn the LLM CLI in `--output-format stream-json` mode and return the
/// parsed events in emission order. Non-JSON or unrecognized lines are
/// skipped rather than failing the whole run, mirroring the teacher's
/// best-effort JSONL parse.
pub async fn run_stream_json(
    config: &CliConfig,
    working_dir: &Path,
    prompt: &str,
) -> Result<Vec<AgentEvent>, DriverError> {
    let mut command = Command::new(&config.binary);
    command
        .arg("--print")
        .arg("--output-format")
        .arg("stream-json")
        .arg("--verbose")
        .arg("--allowedTools")
        .arg(&config.allowed_tools)
        .arg("--permission-mode")
        .arg("acceptEdits")
        .arg("--model")
        .arg(&config.model)
        .arg("--")
        .arg(prompt)
        .current_dir(working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());

    let mut child = command.spawn().map_err(|e| DriverError::Spawn(e.to_string()))?;
    let stdout = child.stdout.take().ok_or_else(|| DriverError::Spawn("failed to capture stdout".into()))?;
    let mut reader = BufReader::new(stdout).lines();

    let mut events = Vec::new();
    while let Some(line) = reader.next_line().await.map_err(|e| DriverError::Io(e.to_string()))? {
        if let Some(event) = AgentEvent::from_stream_json_line(&line) {
            events.push(event);
        }
    }

    let status = child.wait().await.map_err(|e| DriverError::Io(e.to_string()))?;
    if !status.success() && events.is_empty() {
        return Err(DriverError::Spawn(format!("{} exited with {status}", config.binary)));
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_teacher_style_flags() {
        let config = CliConfig::default();
        assert_eq!(config.binary, "claude");
        assert_eq!(config.model, "sonnet");
    }
}
