//! Filesystem write scoping: writes must resolve under the project
//! directory after symlink resolution.

use std::path::Path;

/// Sensitive filename fragments that are always denied regardless of scope,
/// e.g. `.env`, credentials, and secret files.
const SENSITIVE_NAME_FRAGMENTS: &[&str] = &[".env", "credentials", "secret", "secrets", "id_rsa", ".pem"];

/// `true` iff `path`'s filename looks like a sensitive file the driver must
/// never write to.
pub fn path_is_sensitive(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    SENSITIVE_NAME_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

/// `true` iff `path`, once symlinks are resolved, lives under
/// `project_root` (also symlink-resolved). Non-existent paths are resolved
/// component-by-component against their nearest existing ancestor so that a
/// not-yet-created file can still be validated.
pub fn path_is_within_project(path: &Path, project_root: &Path) -> std::io::Result<bool> {
    let resolved_root = canonicalize_best_effort(project_root)?;
    let resolved_path = canonicalize_best_effort(path)?;
    Ok(resolved_path.starts_with(&resolved_root))
}

/// Canonicalize `path`, walking up to the nearest existing ancestor if the
/// path itself (or intermediate components) do not exist yet, then
/// re-appending the non-existent suffix.
fn canonicalize_best_effort(path: &Path) -> std::io::Result<std::path::PathBuf> {
    let mut existing = path.to_path_buf();
    let mut suffix = Vec::new();

    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                suffix.push(name.to_os_string());
                existing = match existing.parent() {
                    Some(parent) => parent.to_path_buf(),
                    None => break,
                };
            }
            None => break,
        }
    }

    let mut canonical = existing.canonicalize().unwrap_or(existing);
    for component in suffix.into_iter().rev() {
        canonical.push(component);
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_sensitive_filenames() {
        assert!(path_is_sensitive(&PathBuf::from("/proj/.env")));
        assert!(path_is_sensitive(&PathBuf::from("/proj/config/secrets.json")));
        assert!(!path_is_sensitive(&PathBuf::from("/proj/src/main.rs")));
    }

    #[test]
    fn write_within_project_is_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("src").join("lib.rs");
        std::fs::create_dir_all(nested.parent().unwrap()).unwrap();
        assert!(path_is_within_project(&nested, tmp.path()).unwrap());
    }

    #[test]
    fn write_outside_project_is_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = PathBuf::from("/tmp").join("escaped-rag-agent-test-file");
        assert!(!path_is_within_project(&outside, tmp.path()).unwrap());
    }
}
