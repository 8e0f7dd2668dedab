use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::workspace::buffer::WorkspaceBuffer;
use crate::workspace::ledger::ChangeLedger;

#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub buffer: WorkspaceBuffer,
    pub ledger: ChangeLedger,
}

/// Session-scoped handle on the buffer and ledger.
///
/// The tool dispatcher and the synchronizer both go through `lock()`, so a
/// sync never observes a half-applied tool call.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<WorkspaceState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, WorkspaceState> {
        self.inner.lock().await
    }

    /// Replace the buffer with files loaded from the repository and seed the
    /// ledger baseline from them.
    pub async fn load<I>(&self, files: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut state = self.lock().await;
        let mut buffer = WorkspaceBuffer::new();
        let mut ledger = ChangeLedger::new();
        for (path, content) in files {
            ledger.record_baseline(&path, &content);
            buffer.write(&path, &content);
        }
        state.buffer = buffer;
        state.ledger = ledger;
    }

    pub async fn snapshot(&self) -> WorkspaceBuffer {
        self.lock().await.buffer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_seeds_buffer_and_baseline() {
        let store = SessionStore::new();
        store.load(vec![("/a.js".to_string(), "x".to_string())]).await;

        let mut state = store.lock().await;
        assert_eq!(state.buffer.get("/a.js"), Some("x"));
        assert!(!state.ledger.mark_dirty("/a.js", "x"));
        assert!(!state.ledger.has_pending());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        store.lock().await.buffer.write("/b.js", "b");
        assert_eq!(other.snapshot().await.get("/b.js"), Some("b"));
    }
}
