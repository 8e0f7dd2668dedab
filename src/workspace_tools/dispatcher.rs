use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::models::ToolResult;
use crate::workspace::{Sandbox, SessionStore};
use crate::workspace_tools::fs::{create_file, delete_file, edit_file, list_dir, read_file};
use crate::workspace_tools::search::{codebase_search, file_search, grep_search};
use crate::workspace_tools::stubs::{diff_history, reapply, run_terminal_cmd, web_search};

pub const TOOL_NAMES: [&str; 12] = [
    "edit_file",
    "create_file",
    "delete_file",
    "read_file",
    "list_dir",
    "grep_search",
    "file_search",
    "codebase_search",
    "run_terminal_cmd",
    "web_search",
    "diff_history",
    "reapply",
];

/// Executes one named tool against the shared workspace.
#[derive(Clone)]
pub struct ToolDispatcher {
    store: SessionStore,
    sandbox: Arc<dyn Sandbox>,
    settle_delay: Duration,
}

impl ToolDispatcher {
    pub fn new(store: SessionStore, sandbox: Arc<dyn Sandbox>, settle_delay: Duration) -> Self {
        Self { store, sandbox, settle_delay }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Run a tool. Every failure is folded into an error result.
    pub async fn dispatch(&self, name: &str, args: &Value) -> ToolResult {
        debug!(tool = name, "dispatching tool");
        match self.run(name, args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                ToolResult::error(e.kind(), e.to_string())
            }
        }
    }

    async fn run(&self, name: &str, args: &Value) -> Result<ToolResult, EngineError> {
        match name {
            "create_file" | "edit_file" | "delete_file" => {
                // Held through the settle delay so a sync cannot interleave.
                let mut state = self.store.lock().await;
                let result = match name {
                    "create_file" => create_file(&mut state, self.sandbox.as_ref(), args)?,
                    "edit_file" => edit_file(&mut state, self.sandbox.as_ref(), args)?,
                    _ => delete_file(&mut state, self.sandbox.as_ref(), args)?,
                };
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                Ok(result)
            }
            "read_file" | "list_dir" | "grep_search" | "file_search" | "codebase_search" => {
                let state = self.store.lock().await;
                match name {
                    "read_file" => read_file(&state.buffer, args),
                    "list_dir" => list_dir(&state.buffer, args),
                    "grep_search" => grep_search(&state.buffer, args),
                    "file_search" => file_search(&state.buffer, args),
                    _ => codebase_search(&state.buffer, args),
                }
            }
            "run_terminal_cmd" => run_terminal_cmd(args),
            "web_search" => web_search(args),
            "diff_history" => diff_history(args),
            "reapply" => reapply(args),
            _ => Err(EngineError::validation(format!("Unknown tool: {}", name))),
        }
    }
}
