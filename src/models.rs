use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

pub type ID = String;

pub const GREETING: &str =
  "Hi! I can read and edit the files in this workspace. Tell me what you'd like to build or change.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
  pub id: ID,
  #[serde(with = "time::serde::rfc3339")]
  pub timestamp: OffsetDateTime,
  #[serde(flatten)]
  pub body: MessageBody,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
  UserMessage { content: String },
  AssistantMessage { content: String },
  ToolCall { tool_call: ToolCallRecord },
  ToolResult { tool_call_id: ID, result: ToolResult },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCallRecord {
  pub id: ID,
  pub name: String,
  pub arguments: Value,
}

impl Message {
  fn with_body(body: MessageBody) -> Self {
    Self { id: new_id(), timestamp: OffsetDateTime::now_utc(), body }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self::with_body(MessageBody::UserMessage { content: content.into() })
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self::with_body(MessageBody::AssistantMessage { content: content.into() })
  }

  pub fn tool_call(id: impl Into<ID>, name: impl Into<String>, arguments: Value) -> Self {
    Self::with_body(MessageBody::ToolCall {
      tool_call: ToolCallRecord { id: id.into(), name: name.into(), arguments },
    })
  }

  pub fn tool_result(tool_call_id: impl Into<ID>, result: ToolResult) -> Self {
    Self::with_body(MessageBody::ToolResult { tool_call_id: tool_call_id.into(), result })
  }

  pub fn greeting() -> Self {
    Self::assistant(GREETING)
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
  Success,
  Error,
}

/// Envelope every tool handler returns, fully implemented or not.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolResult {
  pub status: ToolStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(flatten)]
  pub details: Map<String, Value>,
}

impl ToolResult {
  pub fn success(message: impl Into<String>, details: Value) -> Self {
    let details = match details {
      Value::Object(map) => map,
      Value::Null => Map::new(),
      other => {
        let mut map = Map::new();
        map.insert("value".to_string(), other);
        map
      }
    };
    Self { status: ToolStatus::Success, message: Some(message.into()), error: None, details }
  }

  pub fn error(kind: &str, error: impl Into<String>) -> Self {
    let mut details = Map::new();
    details.insert("error_kind".to_string(), Value::String(kind.to_string()));
    Self { status: ToolStatus::Error, message: None, error: Some(error.into()), details }
  }

  pub fn is_success(&self) -> bool {
    self.status == ToolStatus::Success
  }

  pub fn detail(&self, key: &str) -> Option<&Value> {
    self.details.get(key)
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
  Absent,
  Unmodified,
  Modified,
  Added,
  Deleted,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusEntry {
  pub path: String,
  pub head: FileState,
  pub workdir: FileState,
  pub stage: FileState,
}

impl StatusEntry {
  /// True when head, working copy and stage do not all agree. A hint only:
  /// callers must still compare contents.
  pub fn disagrees(&self) -> bool {
    let head_present = self.head != FileState::Absent;
    !(head_present && self.workdir == FileState::Unmodified && self.stage == FileState::Unmodified)
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Author {
  pub name: String,
  pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub id: String,
  pub title: String,
  pub description: String,
  pub author: Author,
  pub branch: String,
  pub paths: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
  pub number: u64,
  pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettingsKV {
  pub key: String,
  pub value: String,
  pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCallRow {
  pub id: ID,
  pub run_id: ID,
  pub name: String,
  pub args_json: String,
  pub result_json: String,
  pub created_at: String,
}

pub fn new_id() -> ID {
  Uuid::new_v4().to_string()
}

pub fn now_iso() -> String {
  OffsetDateTime::now_utc()
    .format(&time::format_description::well_known::Rfc3339)
    .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn message_serializes_with_type_tag() {
    let msg = Message::tool_call("call_1", "read_file", json!({ "target_file": "/a.js" }));
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "tool_call");
    assert_eq!(value["tool_call"]["name"], "read_file");
    assert!(value["timestamp"].as_str().unwrap().contains('T'));
  }

  #[test]
  fn tool_result_flattens_details() {
    let result = ToolResult::success("ok", json!({ "old_content": "x" }));
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value, json!({ "status": "success", "message": "ok", "old_content": "x" }));

    let err = ToolResult::error("not_found", "missing");
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error_kind"], "not_found");
    assert!(value.get("message").is_none());
  }

  #[test]
  fn unchanged_tracked_entry_agrees() {
    let entry = StatusEntry {
      path: "/a.js".into(),
      head: FileState::Unmodified,
      workdir: FileState::Unmodified,
      stage: FileState::Unmodified,
    };
    assert!(!entry.disagrees());

    let untracked = StatusEntry { head: FileState::Absent, workdir: FileState::Added, stage: FileState::Absent, ..entry };
    assert!(untracked.disagrees());
  }
}
