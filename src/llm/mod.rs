pub mod client;
pub mod types;
pub mod wire;

pub use client::{CompletionClient, HttpCompletionClient};
pub use types::*;
pub use wire::to_wire_messages;
