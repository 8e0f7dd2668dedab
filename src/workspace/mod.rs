pub mod buffer;
pub mod ledger;
pub mod sandbox;
pub mod store;

pub use buffer::{DirEntry, WorkspaceBuffer};
pub use ledger::ChangeLedger;
pub use sandbox::{NullSandbox, Sandbox};
pub use store::{SessionStore, WorkspaceState};
