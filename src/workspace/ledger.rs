use std::collections::{BTreeSet, HashMap};

/// Tracks which workspace paths were mutated since the last commit.
///
/// Each path remembers its last-known content; `None` records a deletion.
/// A mutation that reproduces the last-known content leaves the dirty set
/// untouched.
#[derive(Debug, Default)]
pub struct ChangeLedger {
    last_known: HashMap<String, Option<String>>,
    dirty: BTreeSet<String>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed last-known content for a file loaded from the repository.
    pub fn record_baseline(&mut self, path: &str, content: &str) {
        self.last_known.insert(path.to_string(), Some(content.to_string()));
    }

    /// Returns false when the write was a no-op.
    pub fn mark_dirty(&mut self, path: &str, content: &str) -> bool {
        self.mark(path, Some(content))
    }

    pub fn mark_deleted(&mut self, path: &str) -> bool {
        self.mark(path, None)
    }

    fn mark(&mut self, path: &str, content: Option<&str>) -> bool {
        if let Some(previous) = self.last_known.get(path) {
            if previous.as_deref() == content {
                return false;
            }
        }
        self.last_known.insert(path.to_string(), content.map(str::to_string));
        self.dirty.insert(path.to_string());
        true
    }

    pub fn dirty_paths(&self) -> Vec<String> {
        self.dirty.iter().cloned().collect()
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.dirty.contains(path)
    }

    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Last-known content, `Some(None)` for a recorded deletion.
    pub fn last_known(&self, path: &str) -> Option<Option<&str>> {
        self.last_known.get(path).map(|c| c.as_deref())
    }

    /// Drop dirty paths matching `excluded`. Returns the pruned paths.
    pub fn prune<F>(&mut self, excluded: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let pruned: Vec<String> = self.dirty.iter().filter(|p| excluded(p)).cloned().collect();
        for path in &pruned {
            self.dirty.remove(path);
        }
        pruned
    }

    /// Forget the dirty set after a successful commit. Last-known content is
    /// kept: it now matches the committed tree.
    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}
