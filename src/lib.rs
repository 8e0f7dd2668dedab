pub mod changes;
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod history;
pub mod hosting;
pub mod llm;
pub mod models;
pub mod sync;
pub mod vcs;
pub mod workflows;
pub mod workspace;
pub mod workspace_tools;

pub use commands::Workbench;
pub use errors::EngineError;
