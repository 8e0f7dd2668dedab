use crate::llm::types::{ContentBlock, Role, WireContent, WireMessage};
use crate::models::{Message, MessageBody};

/// Translate the conversation log into the completion wire format.
///
/// Consecutive entries with the same role are merged into one message of
/// content blocks. Assistant entries that precede the first user entry (the
/// greeting) are not sent, since the wire format must open with a user turn.
pub fn to_wire_messages(log: &[Message]) -> Vec<WireMessage> {
    let mut out: Vec<(Role, Vec<ContentBlock>)> = Vec::new();

    let first_user = log.iter().position(|m| matches!(m.body, MessageBody::UserMessage { .. }));
    let Some(start) = first_user else {
        return Vec::new();
    };

    for message in &log[start..] {
        let (role, block) = match &message.body {
            MessageBody::UserMessage { content } => (Role::User, ContentBlock::Text { text: content.clone() }),
            MessageBody::AssistantMessage { content } => {
                (Role::Assistant, ContentBlock::Text { text: content.clone() })
            }
            MessageBody::ToolCall { tool_call } => (
                Role::Assistant,
                ContentBlock::ToolUse {
                    id: tool_call.id.clone(),
                    name: tool_call.name.clone(),
                    input: tool_call.arguments.clone(),
                },
            ),
            MessageBody::ToolResult { tool_call_id, result } => (
                Role::User,
                ContentBlock::ToolResult {
                    tool_use_id: tool_call_id.clone(),
                    content: serde_json::to_string(result).unwrap_or_else(|e| {
                        format!("{{\"status\":\"error\",\"error\":\"unserializable result: {}\"}}", e)
                    }),
                },
            ),
        };

        match out.last_mut() {
            Some((last_role, blocks)) if *last_role == role => blocks.push(block),
            _ => out.push((role, vec![block])),
        }
    }

    out.into_iter()
        .map(|(role, mut blocks)| {
            let content = match blocks.pop() {
                Some(ContentBlock::Text { text }) if blocks.is_empty() => WireContent::Text(text),
                Some(last) => {
                    blocks.push(last);
                    WireContent::Blocks(blocks)
                }
                None => WireContent::Blocks(blocks),
            };
            WireMessage { role, content }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn greeting_is_skipped_and_plain_turns_stay_text() {
        let log = vec![Message::greeting(), Message::user("hello"), Message::assistant("hi there")];
        let wire = to_wire_messages(&log);
        assert_eq!(
            wire,
            vec![
                WireMessage { role: Role::User, content: WireContent::Text("hello".into()) },
                WireMessage { role: Role::Assistant, content: WireContent::Text("hi there".into()) },
            ]
        );
    }

    #[test]
    fn tool_rounds_become_alternating_block_messages() {
        let log = vec![
            Message::user("make a file"),
            Message::assistant("Creating it."),
            Message::tool_call("t1", "create_file", json!({ "file_path": "/a.js", "content": "x" })),
            Message::tool_result("t1", ToolResult::success("created", json!({}))),
            Message::assistant("Done."),
        ];
        let wire = to_wire_messages(&log);
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0].role, Role::User);

        let WireContent::Blocks(blocks) = &wire[1].content else {
            panic!("expected blocks for assistant tool round");
        };
        assert_eq!(wire[1].role, Role::Assistant);
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text == "Creating it."));
        assert!(matches!(&blocks[1], ContentBlock::ToolUse { id, .. } if id == "t1"));

        assert_eq!(wire[2].role, Role::User);
        let WireContent::Blocks(results) = &wire[2].content else {
            panic!("expected tool_result blocks");
        };
        let ContentBlock::ToolResult { tool_use_id, content } = &results[0] else {
            panic!("expected tool_result");
        };
        assert_eq!(tool_use_id, "t1");
        let decoded: serde_json::Value = serde_json::from_str(content).unwrap();
        assert_eq!(decoded["status"], "success");
    }

    #[test]
    fn empty_log_sends_nothing() {
        assert!(to_wire_messages(&[Message::greeting()]).is_empty());
    }
}
