//! Tool declarations sent to the LLM SDK, serialised to its tool-schema
//! JSON. Which set is declared depends on the session kind.

use serde::Serialize;
use serde_json::json;

use crate::domain::SessionKind;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

fn file_tools() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: "read".into(),
            description: "Read a file within the project directory".into(),
            input_schema: json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}),
        },
        ToolDeclaration {
            name: "write".into(),
            description: "Write a file within the project directory".into(),
            input_schema: json!({"type": "object", "properties": {"path": {"type": "string"}, "content": {"type": "string"}}, "required": ["path", "content"]}),
        },
        ToolDeclaration {
            name: "edit".into(),
            description: "Replace a substring within a file in the project directory".into(),
            input_schema: json!({"type": "object", "properties": {"path": {"type": "string"}, "old": {"type": "string"}, "new": {"type": "string"}}, "required": ["path", "old", "new"]}),
        },
        ToolDeclaration {
            name: "glob".into(),
            description: "List files in the project directory matching a glob pattern".into(),
            input_schema: json!({"type": "object", "properties": {"pattern": {"type": "string"}}, "required": ["pattern"]}),
        },
        ToolDeclaration {
            name: "grep".into(),
            description: "Search file contents in the project directory".into(),
            input_schema: json!({"type": "object", "properties": {"pattern": {"type": "string"}}, "required": ["pattern"]}),
        },
    ]
}

fn shell_tool() -> ToolDeclaration {
    ToolDeclaration {
        name: "bash".into(),
        description: "Run a shell command, subject to the sandbox's binary allow-list".into(),
        input_schema: json!({"type": "object", "properties": {"command": {"type": "string"}}, "required": ["command"]}),
    }
}

fn tracker_tools() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: "tracker_list_items".into(),
            description: "List work items in the current project".into(),
            input_schema: json!({"type": "object", "properties": {"status": {"type": "string"}}}),
        },
        ToolDeclaration {
            name: "tracker_pick_item".into(),
            description: "Pick the highest-priority todo item".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDeclaration {
            name: "tracker_update_item".into(),
            description: "Update a work item's status".into(),
            input_schema: json!({"type": "object", "properties": {"item_id": {"type": "string"}, "status": {"type": "string"}}, "required": ["item_id", "status"]}),
        },
        ToolDeclaration {
            name: "tracker_append_comment".into(),
            description: "Append a comment to a work item".into(),
            input_schema: json!({"type": "object", "properties": {"item_id": {"type": "string"}, "body": {"type": "string"}}, "required": ["item_id", "body"]}),
        },
        ToolDeclaration {
            name: "tracker_update_meta_item".into(),
            description: "Append a session summary to the project's meta item".into(),
            input_schema: json!({"type": "object", "properties": {"body": {"type": "string"}}, "required": ["body"]}),
        },
    ]
}

fn retrieval_tools() -> Vec<ToolDeclaration> {
    vec![ToolDeclaration {
        name: "retrieval_query".into(),
        description: "Query the corpus retrieval engine".into(),
        input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}, "mode": {"type": "string"}}, "required": ["query"]}),
    }]
}

/// Build the tool set declared to the LLM for a session of the given kind.
/// Retrieval tools are declared only for `Library` sessions -- the one point
/// where Core A calls into Core B. `Web` sessions get the same baseline set
/// as `Init`/`InitBis`; no browser-automation tool is wired to a real
/// dispatch path, so none is declared.
pub fn declare_tools(kind: SessionKind) -> Vec<ToolDeclaration> {
    let mut tools = file_tools();
    tools.push(shell_tool());
    tools.extend(tracker_tools());
    if kind == SessionKind::Library {
        tools.extend(retrieval_tools());
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_sessions_declare_the_baseline_set_without_retrieval() {
        let names: Vec<_> = declare_tools(SessionKind::Web).into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"bash".to_string()));
        assert!(names.contains(&"tracker_list_items".to_string()));
        assert!(!names.contains(&"retrieval_query".to_string()));
    }

    #[test]
    fn library_sessions_declare_retrieval_tools() {
        let names: Vec<_> = declare_tools(SessionKind::Library).into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"retrieval_query".to_string()));
    }
}
