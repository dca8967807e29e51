//! Environment constants and path utilities.
//!
//! Centralizes the hardcoded paths and directory names used throughout the
//! application so they stay consistent and easy to change in one place.

use std::path::PathBuf;

/// Main application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".rag-agent";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Project-marker file name (idempotency key for "project initialised")
pub const PROJECT_MARKER_FILE_NAME: &str = "project_marker.json";

/// Session-related directory and file names
pub mod session {
    pub const SESSIONS_DIR_NAME: &str = "sessions";
    pub const LOGS_DIR_NAME: &str = "logs";
    pub const AGENT_LOGS_DIR_NAME: &str = "agent";
    pub const SESSION_FILE_NAME: &str = "session.json";
}

/// Ingestion-related directory and file names
pub mod ingest {
    pub const OCR_CACHE_DIR_NAME: &str = "ocr_cache";
    pub const IMAGES_DIR_NAME: &str = "images";
    pub const SUMMARY_CHECKPOINT_SUFFIX: &str = "_summaries.json";
    pub const CHUNKS_OUTPUT_SUFFIX: &str = "_chunks.json";
    pub const MARKDOWN_SUFFIX: &str = ".md";
    pub const OCR_SUFFIX: &str = "_ocr.json";
}

/// Build the main app directory path from a project root.
pub fn app_dir_path(project_root: &std::path::Path) -> PathBuf {
    project_root.join(APP_DIR_NAME)
}

/// Build the project-marker file path.
pub fn project_marker_path(project_root: &std::path::Path) -> PathBuf {
    project_root.join(PROJECT_MARKER_FILE_NAME)
}

/// Build the sessions directory path from a project root.
pub fn sessions_dir_path(project_root: &std::path::Path) -> PathBuf {
    app_dir_path(project_root).join(session::SESSIONS_DIR_NAME)
}

/// Build a specific session directory path.
pub fn session_dir_path(project_root: &std::path::Path, session_id: &str) -> PathBuf {
    sessions_dir_path(project_root).join(session_id)
}

/// Build the agent-driver log directory path for a session.
pub fn agent_logs_dir_path(project_root: &std::path::Path, session_id: &str) -> PathBuf {
    session_dir_path(project_root, session_id)
        .join(session::LOGS_DIR_NAME)
        .join(session::AGENT_LOGS_DIR_NAME)
}

/// Build the OCR cache directory path for an ingestion output root.
pub fn ocr_cache_dir_path(output_root: &std::path::Path) -> PathBuf {
    output_root.join(ingest::OCR_CACHE_DIR_NAME)
}

/// Build the OCR cache file path for a document stem.
pub fn ocr_cache_file_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    ocr_cache_dir_path(output_root).join(format!("{doc_stem}.json"))
}

/// Build the per-document output directory path (`output/<doc>/`).
pub fn doc_output_dir_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    output_root.join(doc_stem)
}

/// Build the `<doc>_chunks.json` path.
pub fn chunks_output_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    doc_output_dir_path(output_root, doc_stem)
        .join(format!("{doc_stem}{}", ingest::CHUNKS_OUTPUT_SUFFIX))
}

/// Build the `<doc>_summaries.json` checkpoint path.
pub fn summaries_checkpoint_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    doc_output_dir_path(output_root, doc_stem)
        .join(format!("{doc_stem}{}", ingest::SUMMARY_CHECKPOINT_SUFFIX))
}

/// Build the structured markdown output path.
pub fn markdown_output_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    doc_output_dir_path(output_root, doc_stem).join(format!("{doc_stem}{}", ingest::MARKDOWN_SUFFIX))
}

/// Build the images directory path for a document.
pub fn images_dir_path(output_root: &std::path::Path, doc_stem: &str) -> PathBuf {
    doc_output_dir_path(output_root, doc_stem).join(ingest::IMAGES_DIR_NAME)
}

/// Build config directory path in user's home directory.
pub fn user_config_dir_path(home_dir: &std::path::Path) -> PathBuf {
    home_dir.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory.
pub fn user_config_file_path(home_dir: &std::path::Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory.
pub fn local_config_file_path(current_dir: &std::path::Path) -> PathBuf {
    current_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_path_construction() {
        let project = Path::new("/test/project");
        let session_id = "test-session-123";

        assert_eq!(app_dir_path(project), Path::new("/test/project/.rag-agent"));
        assert_eq!(
            sessions_dir_path(project),
            Path::new("/test/project/.rag-agent/sessions")
        );
        assert_eq!(
            session_dir_path(project, session_id),
            Path::new("/test/project/.rag-agent/sessions/test-session-123")
        );
        assert_eq!(
            agent_logs_dir_path(project, session_id),
            Path::new("/test/project/.rag-agent/sessions/test-session-123/logs/agent")
        );
        assert_eq!(
            project_marker_path(project),
            Path::new("/test/project/project_marker.json")
        );
    }

    #[test]
    fn test_ingest_output_paths() {
        let out = Path::new("/data/output");
        assert_eq!(
            chunks_output_path(out, "meno"),
            Path::new("/data/output/meno/meno_chunks.json")
        );
        assert_eq!(
            markdown_output_path(out, "meno"),
            Path::new("/data/output/meno/meno.md")
        );
        assert_eq!(
            images_dir_path(out, "meno"),
            Path::new("/data/output/meno/images")
        );
        assert_eq!(
            ocr_cache_file_path(out, "meno"),
            Path::new("/data/output/ocr_cache/meno.json")
        );
    }

    #[test]
    fn test_config_paths() {
        let home_dir = Path::new("/home/user");
        let current_dir = Path::new("/current/project");

        assert_eq!(
            user_config_file_path(home_dir),
            Path::new("/home/user/.rag-agent/config.toml")
        );
        assert_eq!(
            local_config_file_path(current_dir),
            Path::new("/current/project/.rag-agent/config.toml")
        );
    }
}
