pub mod args;
pub mod dispatcher;
pub mod fs;
pub mod logging;
pub mod safety;
pub mod schemas;
pub mod search;
pub mod stubs;

pub use dispatcher::{ToolDispatcher, TOOL_NAMES};
pub use logging::{list_tool_calls, log_tool_call};
pub use schemas::workspace_tool_schemas;
