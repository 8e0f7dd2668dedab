use thiserror::Error;

use crate::db::DbError;
use crate::llm::LlmError;
use crate::workspace_tools::safety::SafetyError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("external service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    ExternalService { status: Option<u16>, message: String },
    #[error("sync failed for {path}: {message}")]
    Sync { path: String, message: String },
    #[error("authentication required: {0}")]
    Auth(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EngineError::NotFound(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        EngineError::ExternalService { status: None, message: message.into() }
    }

    /// Short class name fed back to the model inside error tool results.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::NotFound(_) => "not_found",
            EngineError::ExternalService { .. } => "external_service",
            EngineError::Sync { .. } => "sync",
            EngineError::Auth(_) => "auth",
            EngineError::Io(_) => "io",
            EngineError::Database(_) => "database",
            EngineError::Serialization(_) => "serialization",
        }
    }
}

impl From<LlmError> for EngineError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Api { status, message } => EngineError::ExternalService { status: Some(status), message },
            LlmError::MissingApiKey => EngineError::Auth(e.to_string()),
            other => EngineError::external(other.to_string()),
        }
    }
}

impl From<SafetyError> for EngineError {
    fn from(e: SafetyError) -> Self {
        match e {
            SafetyError::PathTraversal | SafetyError::InvalidPath(_) => EngineError::Validation(e.to_string()),
            SafetyError::CommandFailed(_) | SafetyError::Timeout => EngineError::external(e.to_string()),
        }
    }
}
