use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: WireContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<WireMessage>,
    pub tools: Vec<ToolSchema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl CompletionResponse {
    /// Split the ordered blocks into the reply text (if any) and the tool
    /// invocations in response order.
    pub fn into_parts(self) -> (Option<String>, Vec<ToolInvocation>) {
        let mut texts = Vec::new();
        let mut invocations = Vec::new();
        for block in self.content {
            match block {
                ContentBlock::Text { text } => {
                    if !text.trim().is_empty() {
                        texts.push(text);
                    }
                }
                ContentBlock::ToolUse { id, name, input } => {
                    invocations.push(ToolInvocation { id, name, input });
                }
                ContentBlock::ToolResult { .. } => {}
            }
        }
        let text = if texts.is_empty() { None } else { Some(texts.join("\n\n")) };
        (text, invocations)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider_name: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub extra_headers: Value,
}

/// Body posted to the messages endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesApiRequest<'a> {
    pub model: &'a str,
    pub max_tokens: i64,
    pub temperature: f64,
    pub system: &'a str,
    pub messages: &'a [WireMessage],
    pub tools: &'a [ToolSchema],
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Missing API key. Set the api_key setting or WORKBENCH_API_KEY environment variable.")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited")]
    RateLimited,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn response_parses_text_and_tool_use_in_order() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Let me look." },
                { "type": "tool_use", "id": "t1", "name": "read_file", "input": { "target_file": "/a.js" } },
                { "type": "tool_use", "id": "t2", "name": "list_dir", "input": { "relative_workspace_path": "/" } }
            ],
            "stop_reason": "tool_use"
        }))
        .unwrap();

        let (text, invocations) = response.into_parts();
        assert_eq!(text.as_deref(), Some("Let me look."));
        let names: Vec<&str> = invocations.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["read_file", "list_dir"]);
    }

    #[test]
    fn blank_text_is_dropped() {
        let response = CompletionResponse {
            content: vec![ContentBlock::Text { text: "  \n".into() }],
            stop_reason: None,
        };
        let (text, invocations) = response.into_parts();
        assert!(text.is_none());
        assert!(invocations.is_empty());
    }

    #[test]
    fn wire_message_serializes_plain_text_and_blocks() {
        let plain = WireMessage { role: Role::User, content: WireContent::Text("hi".into()) };
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!({ "role": "user", "content": "hi" }));

        let blocks = WireMessage {
            role: Role::User,
            content: WireContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: "{}".into(),
            }]),
        };
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!({ "role": "user", "content": [{ "type": "tool_result", "tool_use_id": "t1", "content": "{}" }] })
        );
    }
}
