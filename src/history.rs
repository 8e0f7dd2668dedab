use tracing::warn;

use crate::db::Database;
use crate::errors::EngineError;
use crate::models::{new_id, Message};

const MESSAGES_KEY: &str = "messages";
const SESSION_KEY: &str = "session_id";

pub fn encode(messages: &[Message]) -> Result<String, EngineError> {
    Ok(serde_json::to_string(messages)?)
}

/// `None` for anything that is not a non-empty array of messages.
pub fn decode(raw: &str) -> Option<Vec<Message>> {
    match serde_json::from_str::<Vec<Message>>(raw) {
        Ok(messages) if !messages.is_empty() => Some(messages),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "persisted message log is malformed");
            None
        }
    }
}

/// Restore the log. Absent, empty or malformed data yields a fresh greeting.
pub fn load_messages(db: &Database) -> Vec<Message> {
    let raw = match db.get_state(MESSAGES_KEY) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "could not read message log");
            None
        }
    };
    raw.as_deref().and_then(decode).unwrap_or_else(|| vec![Message::greeting()])
}

pub fn save_messages(db: &Database, messages: &[Message]) -> Result<(), EngineError> {
    db.put_state(MESSAGES_KEY, &encode(messages)?)?;
    Ok(())
}

pub fn reset_history(db: &Database) -> Result<Vec<Message>, EngineError> {
    let messages = vec![Message::greeting()];
    save_messages(db, &messages)?;
    Ok(messages)
}

/// The id tool calls are audited under. Minted and stored on first use so a
/// restored conversation keeps its audit trail.
pub fn load_session_id(db: &Database) -> Result<String, EngineError> {
    if let Some(id) = db.get_state(SESSION_KEY)?.filter(|id| !id.trim().is_empty()) {
        return Ok(id);
    }
    let id = new_id();
    db.put_state(SESSION_KEY, &id)?;
    Ok(id)
}
