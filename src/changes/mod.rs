pub mod diff;
pub mod engine;

pub use diff::{positional_diff, ChangeKind, DiffLine, FileDiff};
pub use engine::{ChangeEngine, DiffOutcome};
