//! The pull-style event stream the driver exposes over the LLM CLI's
//! `stream-json` output, generalising the single blocking round-trip the
//! teacher's interface used into a typed per-turn stream.

use serde::{Deserialize, Serialize};

/// One tool invocation the assistant turn asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Token/cost usage reported by the LLM CLI for a session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A single event in the session's message stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    SystemInit { session_id: String },
    AssistantTurn { content: String, tool_uses: Vec<ToolUse> },
    ToolResult { tool_use_id: String, output: String },
    Result { summary: String, usage: Usage },
}

impl AgentEvent {
    /// Parse one `stream-json` (JSONL) line into an `AgentEvent`, returning
    /// `None` for event types this driver does not model (e.g. `user`
    /// echoes) rather than failing the whole stream.
    pub fn from_stream_json_line(line: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        match value.get("type").and_then(|t| t.as_str())? {
            "system" => Some(AgentEvent::SystemInit {
                session_id: value.get("session_id").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
            }),
            "assistant" => {
                let message = value.get("message")?;
                let content_array = message.get("content")?.as_array()?;
                let mut text = String::new();
                let mut tool_uses = Vec::new();
                for item in content_array {
                    match item.get("type").and_then(|t| t.as_str()) {
                        Some("text") => {
                            if let Some(t) = item.get("text").and_then(|t| t.as_str()) {
                                text.push_str(t);
                            }
                        }
                        Some("tool_use") => {
                            tool_uses.push(ToolUse {
                                id: item.get("id").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
                                name: item.get("name").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
                                input: item.get("input").cloned().unwrap_or(serde_json::Value::Null),
                            });
                        }
                        _ => {}
                    }
                }
                Some(AgentEvent::AssistantTurn { content: text, tool_uses })
            }
            "result" => Some(AgentEvent::Result {
                summary: value.get("result").and_then(|r| r.as_str()).unwrap_or_default().to_string(),
                usage: Usage {
                    input_tokens: value
                        .get("usage")
                        .and_then(|u| u.get("input_tokens"))
                        .and_then(|n| n.as_u64())
                        .unwrap_or(0),
                    output_tokens: value
                        .get("usage")
                        .and_then(|u| u.get("output_tokens"))
                        .and_then(|n| n.as_u64())
                        .unwrap_or(0),
                },
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assistant_turn_with_tool_use() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"looking"},{"type":"tool_use","id":"t1","name":"read","input":{"path":"a.rs"}}]}}"#;
        let event = AgentEvent::from_stream_json_line(line).unwrap();
        match event {
            AgentEvent::AssistantTurn { content, tool_uses } => {
                assert_eq!(content, "looking");
                assert_eq!(tool_uses.len(), 1);
                assert_eq!(tool_uses[0].name, "read");
            }
            _ => panic!("expected AssistantTurn"),
        }
    }

    #[test]
    fn parses_result_event_with_usage() {
        let line = r#"{"type":"result","result":"done","usage":{"input_tokens":10,"output_tokens":20}}"#;
        let event = AgentEvent::from_stream_json_line(line).unwrap();
        match event {
            AgentEvent::Result { summary, usage } => {
                assert_eq!(summary, "done");
                assert_eq!(usage.input_tokens, 10);
                assert_eq!(usage.output_tokens, 20);
            }
            _ => panic!("expected Result"),
        }
    }

    #[test]
    fn returns_none_for_unrecognized_event_type() {
        assert!(AgentEvent::from_stream_json_line(r#"{"type":"user"}"#).is_none());
        assert!(AgentEvent::from_stream_json_line("not json").is_none());
    }
}
