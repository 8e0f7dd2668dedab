use ignore::WalkBuilder;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::workspace::{SessionStore, WorkspaceState};
use crate::workspace_tools::safety::{disk_path, normalize_path};

/// Path segments never written to, or loaded from, the working directory.
const EXCLUDED_SEGMENTS: [&str; 2] = ["node_modules", ".git"];

#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing dirty, or everything dirty was already written.
    NoOp,
    Complete { synced: Vec<String> },
    Partial { synced: Vec<String>, errors: Vec<EngineError> },
}

impl SyncOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, SyncOutcome::NoOp)
    }
}

pub fn is_excluded_namespace(path: &str) -> bool {
    path.split('/').any(|segment| EXCLUDED_SEGMENTS.contains(&segment))
}

/// Projects the workspace buffer onto the working directory of the
/// repository.
pub struct Synchronizer {
    store: SessionStore,
    root: PathBuf,
    scaffold_paths: Vec<String>,
    written: Mutex<HashMap<String, Option<String>>>,
}

impl Synchronizer {
    pub fn new(store: SessionStore, root: impl Into<PathBuf>, scaffold_paths: Vec<String>) -> Self {
        Self { store, root: root.into(), scaffold_paths, written: Mutex::new(HashMap::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build-scaffold files that belong to the sandbox rather than the
    /// repository. Entries ending in `/` match a whole directory.
    pub fn is_scaffold(&self, path: &str) -> bool {
        self.scaffold_paths.iter().any(|pattern| {
            if pattern.ends_with('/') {
                path.starts_with(pattern.as_str())
            } else {
                path == pattern
            }
        })
    }

    /// True once any content has been written since the last commit.
    pub async fn has_synced(&self) -> bool {
        !self.written.lock().await.is_empty()
    }

    /// Forget what was written, after the changes were committed.
    pub async fn forget(&self) {
        self.written.lock().await.clear();
    }

    pub async fn sync(&self) -> SyncOutcome {
        let mut state = self.store.lock().await;
        self.sync_locked(&mut state).await
    }

    /// [`Synchronizer::sync`] for a caller that already holds the store lock
    /// and keeps it across the work that follows.
    pub async fn sync_locked(&self, state: &mut WorkspaceState) -> SyncOutcome {
        let mut written = self.written.lock().await;

        let pruned = state.ledger.prune(|p| self.is_scaffold(p) || is_excluded_namespace(p));
        if !pruned.is_empty() {
            debug!(?pruned, "pruned scaffold and excluded paths from ledger");
        }

        let dirty = state.ledger.dirty_paths();
        if dirty.is_empty() {
            return SyncOutcome::NoOp;
        }

        let mut synced = Vec::new();
        let mut errors = Vec::new();

        for raw in dirty {
            let path = match normalize_path(&raw) {
                Ok(p) => p,
                Err(e) => {
                    errors.push(EngineError::Sync { path: raw, message: e.to_string() });
                    continue;
                }
            };
            if is_excluded_namespace(&path) {
                state.ledger.prune(|p| p == raw);
                continue;
            }

            let content = state.buffer.get(&path).map(str::to_string);
            if written.get(&path) == Some(&content) {
                continue;
            }

            match self.write_one(&path, content.as_deref()).await {
                Ok(()) => {
                    written.insert(path.clone(), content);
                    synced.push(path);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to sync file");
                    errors.push(EngineError::Sync { path, message: e.to_string() });
                }
            }
        }

        if synced.is_empty() && errors.is_empty() {
            SyncOutcome::NoOp
        } else if errors.is_empty() {
            info!(files = synced.len(), "workspace synced");
            SyncOutcome::Complete { synced }
        } else {
            info!(files = synced.len(), failures = errors.len(), "workspace partially synced");
            SyncOutcome::Partial { synced, errors }
        }
    }

    async fn write_one(&self, path: &str, content: Option<&str>) -> std::io::Result<()> {
        let target = disk_path(&self.root, path);
        match content {
            Some(content) => {
                if let Some(parent) = target.parent() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        if e.kind() != ErrorKind::AlreadyExists {
                            return Err(e);
                        }
                    }
                }
                tokio::fs::write(&target, content).await
            }
            None => match tokio::fs::remove_file(&target).await {
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        }
    }
}

/// Load the text files of a working directory as `(path, content)` pairs,
/// respecting `.gitignore`. Non-UTF-8 files are skipped.
pub fn read_workdir(root: &Path) -> Vec<(String, String)> {
    let mut files = vec![];
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            !EXCLUDED_SEGMENTS.contains(&name)
        })
        .build();

    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let rel_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => files.push((format!("/{}", rel_path), content)),
            Err(e) => debug!(path = %rel_path, error = %e, "skipping unreadable file"),
        }
    }

    files.sort();
    files
}
