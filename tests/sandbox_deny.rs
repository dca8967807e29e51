//! Scenario 6: a denied shell tool call does not reach the filesystem.

use std::path::PathBuf;

use rag_agent::sandbox::{PolicyDecision, ToolCall, ToolPolicy};

#[test]
fn rm_rf_root_is_denied_as_binary_not_in_allow_list() {
    let policy = ToolPolicy::new(PathBuf::from("/tmp/some-project"));
    let call = ToolCall {
        name: "sh".to_string(),
        shell_command: Some("rm -rf /".to_string()),
        write_path: None,
    };

    let decision = policy.check(&call);
    match decision {
        PolicyDecision::Deny { reason } => assert!(reason.contains("binary not in allow-list")),
        PolicyDecision::Allow => panic!("expected rm to be denied"),
    }
}

#[test]
fn write_outside_project_root_is_denied() {
    let project_root = PathBuf::from("/tmp/some-project");
    let policy = ToolPolicy::new(project_root);
    let call = ToolCall {
        name: "write".to_string(),
        shell_command: None,
        write_path: Some(PathBuf::from("/etc/passwd")),
    };

    assert!(!policy.check(&call).is_allowed());
}

#[test]
fn write_inside_project_root_is_allowed() {
    let project_root = PathBuf::from("/tmp/some-project");
    let policy = ToolPolicy::new(project_root.clone());
    let call = ToolCall {
        name: "write".to_string(),
        shell_command: None,
        write_path: Some(project_root.join("src/lib.rs")),
    };

    assert!(policy.check(&call).is_allowed());
}

#[test]
fn allow_listed_shell_command_is_allowed() {
    let policy = ToolPolicy::new(PathBuf::from("/tmp/some-project"));
    let call = ToolCall {
        name: "bash".to_string(),
        shell_command: Some("cargo test".to_string()),
        write_path: None,
    };

    assert!(policy.check(&call).is_allowed());
}
