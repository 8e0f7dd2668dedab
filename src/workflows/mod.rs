pub mod conversation;

pub use conversation::{Conversation, ConversationSettings, SubmitOutcome, TurnState};
