//! Tools whose real integrations live outside this engine. Each answers with
//! a fixed placeholder in the normal result envelope.

use serde_json::{json, Value};

use crate::errors::EngineError;
use crate::models::ToolResult;
use crate::workspace_tools::args::{optional_bool, required_str};
use crate::workspace_tools::safety::normalize_file_path;

pub fn run_terminal_cmd(args: &Value) -> Result<ToolResult, EngineError> {
    let command = required_str(args, "command")?;
    let is_background = optional_bool(args, "is_background")?.unwrap_or(false);
    let require_user_approval = optional_bool(args, "require_user_approval")?.unwrap_or(true);

    Ok(ToolResult::success(
        "Terminal commands are not available in this workspace; the command was not run.",
        json!({
            "command": command,
            "is_background": is_background,
            "require_user_approval": require_user_approval,
            "executed": false,
            "output": "",
            "exit_code": null,
        }),
    ))
}

pub fn web_search(args: &Value) -> Result<ToolResult, EngineError> {
    let search_term = required_str(args, "search_term")?;
    Ok(ToolResult::success(
        "Web search is not available in this workspace.",
        json!({
            "search_term": search_term,
            "results": [],
        }),
    ))
}

pub fn diff_history(_args: &Value) -> Result<ToolResult, EngineError> {
    Ok(ToolResult::success(
        "No edit history is recorded for this workspace.",
        json!({ "changes": [] }),
    ))
}

pub fn reapply(args: &Value) -> Result<ToolResult, EngineError> {
    let target = normalize_file_path(required_str(args, "target_file")?)?;
    Ok(ToolResult::success(
        "Edits are applied directly; there is nothing to reapply.",
        json!({
            "target_file": target,
            "applied": false,
        }),
    ))
}
