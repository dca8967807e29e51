//! Progress Channel: a push-based, best-effort event stream shared by the
//! ingestion pipeline's ten-step progress and the session loop's coarser
//! per-session events.

use std::io::{IsTerminal, Write};

/// One progress event. Exactly one `Complete` or `Error` event terminates a
/// job; any number of `Step` events may precede it, unordered with respect
/// to wall clock only within the same step.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// A pipeline stage or session-loop milestone.
    Step { step: u32, total: u32, label: String, progress_pct: f32 },
    /// The job finished successfully.
    Complete { label: String },
    /// The job finished with an error.
    Error { label: String, message: String },
}

impl ProgressEvent {
    pub fn step(step: u32, total: u32, label: impl Into<String>) -> Self {
        let progress_pct = if total == 0 { 100.0 } else { (step as f32 / total as f32) * 100.0 };
        ProgressEvent::Step { step, total, label: label.into(), progress_pct }
    }
}

/// Reports progress events. Implementations write to stderr (human or
/// JSON); delivery is best-effort.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "[3/10] classify  30.0%".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Step { step, total, label, progress_pct } => {
                format!("[{step}/{total}] {label}  {progress_pct:.1}%\n")
            }
            ProgressEvent::Complete { label } => format!("{label}  done\n"),
            ProgressEvent::Error { label, message } => format!("{label}  error: {message}\n"),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Step { step, total, label, progress_pct } => serde_json::json!({
                "event": "step",
                "step": step,
                "total": total,
                "label": label,
                "progress_pct": progress_pct,
            }),
            ProgressEvent::Complete { label } => serde_json::json!({"event": "complete", "label": label}),
            ProgressEvent::Error { label, message } => {
                serde_json::json!({"event": "error", "label": label, "message": message})
            }
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{line}");
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if std::io::stderr().is_terminal() {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_computes_progress_percent() {
        let event = ProgressEvent::step(3, 10, "classify");
        match event {
            ProgressEvent::Step { progress_pct, .. } => assert!((progress_pct - 30.0).abs() < f32::EPSILON),
            _ => panic!("expected Step"),
        }
    }

    #[test]
    fn off_mode_never_panics_on_report() {
        let reporter = ProgressMode::Off.reporter();
        reporter.report(ProgressEvent::Complete { label: "ingest".into() });
    }
}
