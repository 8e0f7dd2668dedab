use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::changes::diff::{render_all, FileDiff};
use crate::errors::EngineError;
use crate::hosting::HostingClient;
use crate::models::{Author, CommitRecord, PullRequestRecord, StatusEntry};
use crate::sync::{is_excluded_namespace, SyncOutcome, Synchronizer};
use crate::vcs::VersionControl;
use crate::workspace::{SessionStore, WorkspaceState};
use crate::workspace_tools::safety::disk_path;

/// Result of [`ChangeEngine::generate_diff`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOutcome {
    NoChanges,
    Changes(Vec<FileDiff>),
}

impl DiffOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, DiffOutcome::NoChanges)
    }

    pub fn render(&self) -> String {
        match self {
            DiffOutcome::NoChanges => "No changes.\n".to_string(),
            DiffOutcome::Changes(diffs) => render_all(diffs),
        }
    }
}

/// A path whose working copy differs from HEAD, byte for byte.
#[derive(Debug, Clone, PartialEq)]
struct VerifiedChange {
    path: String,
    head: Option<String>,
    workdir: Option<String>,
}

async fn read_workdir_file(root: &Path, path: &str) -> Result<Option<String>, EngineError> {
    match tokio::fs::read(disk_path(root, path)).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Status, diff, commit, branch, push and pull-request operations over the
/// synchronized working directory.
pub struct ChangeEngine {
    vcs: Arc<dyn VersionControl>,
    sync: Arc<Synchronizer>,
    store: SessionStore,
    hosting: HostingClient,
    author: Author,
}

impl ChangeEngine {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        sync: Arc<Synchronizer>,
        store: SessionStore,
        hosting: HostingClient,
        author: Author,
    ) -> Self {
        Self { vcs, sync, store, hosting, author }
    }

    pub fn vcs(&self) -> &Arc<dyn VersionControl> {
        &self.vcs
    }

    async fn run_sync(&self, state: &mut WorkspaceState) -> SyncOutcome {
        let outcome = self.sync.sync_locked(state).await;
        if let SyncOutcome::Partial { errors, .. } = &outcome {
            for e in errors {
                warn!(error = %e, "sync error");
            }
        }
        outcome
    }

    pub async fn compute_status(&self) -> Result<Vec<StatusEntry>, EngineError> {
        self.vcs.status_matrix().await
    }

    async fn verified_changes(&self) -> Result<Vec<VerifiedChange>, EngineError> {
        let matrix = self.vcs.status_matrix().await?;
        let candidates: BTreeSet<String> = matrix
            .into_iter()
            .filter(|e| e.disagrees() && !is_excluded_namespace(&e.path))
            .map(|e| e.path)
            .collect();

        let mut changes = Vec::new();
        for path in candidates {
            let head = self.vcs.read_head_blob(&path).await?;
            let workdir = read_workdir_file(self.vcs.workdir(), &path).await?;
            if head == workdir {
                debug!(path = %path, "status flagged an unchanged file");
                continue;
            }
            changes.push(VerifiedChange { path, head, workdir });
        }
        Ok(changes)
    }

    /// Holds the store lock from the sync until the working copy has been
    /// read, so a tool call cannot land in between.
    pub async fn generate_diff(&self) -> Result<DiffOutcome, EngineError> {
        let mut state = self.store.lock().await;
        self.run_sync(&mut state).await;

        if !state.ledger.has_pending() && !self.sync.has_synced().await {
            return Ok(DiffOutcome::NoChanges);
        }

        let changes = self.verified_changes().await?;
        if changes.is_empty() {
            return Ok(DiffOutcome::NoChanges);
        }

        Ok(DiffOutcome::Changes(
            changes
                .iter()
                .map(|c| FileDiff::new(&c.path, c.head.as_deref(), c.workdir.as_deref()))
                .collect(),
        ))
    }

    pub async fn commit(&self, title: &str, description: &str) -> Result<CommitRecord, EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::validation("commit title must not be empty"));
        }

        // Held until the ledger is cleared; an edit arriving meanwhile waits
        // and stays pending for the next commit.
        let mut state = self.store.lock().await;
        self.run_sync(&mut state).await;
        let changes = self.verified_changes().await?;
        if changes.is_empty() {
            return Err(EngineError::validation("no changes to commit"));
        }

        for change in &changes {
            self.vcs.add(&change.path).await?;
        }

        let message = if description.trim().is_empty() {
            title.to_string()
        } else {
            format!("{}\n\n{}", title, description.trim())
        };
        let id = self.vcs.commit(&message, &self.author).await?;
        let branch = self.vcs.current_branch().await?.unwrap_or_else(|| "HEAD".to_string());

        state.ledger.clear();
        self.sync.forget().await;
        drop(state);

        let paths: Vec<String> = changes.into_iter().map(|c| c.path).collect();
        info!(commit = %id, branch = %branch, files = paths.len(), "committed");

        Ok(CommitRecord {
            id,
            title: title.to_string(),
            description: description.trim().to_string(),
            author: self.author.clone(),
            branch,
            paths,
        })
    }

    /// Check out `name`, creating it first when it does not exist.
    pub async fn create_branch(&self, name: &str) -> Result<String, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::validation("branch name must not be empty"));
        }
        if self.vcs.current_branch().await?.as_deref() == Some(name) {
            return Ok(name.to_string());
        }
        if !self.vcs.branch_exists(name).await? {
            self.vcs.create_branch(name).await?;
            info!(branch = name, "branch created");
        }
        self.vcs.checkout(name).await?;
        Ok(name.to_string())
    }

    /// Push `branch` to origin. Returns the credential for reuse by
    /// [`ChangeEngine::create_pull_request`].
    pub async fn push(&self, branch: &str, credential: Option<&str>) -> Result<String, EngineError> {
        let credential = match credential {
            Some(c) if !c.trim().is_empty() => c.trim().to_string(),
            _ => return Err(EngineError::Auth("a push credential is required".into())),
        };
        self.vcs.push(branch, &credential).await?;
        info!(branch, "pushed");
        Ok(credential)
    }

    pub async fn create_pull_request(
        &self,
        repo: &str,
        branch: &str,
        title: &str,
        body: &str,
        credential: &str,
    ) -> Result<PullRequestRecord, EngineError> {
        self.hosting.create_pull_request(repo, branch, title, body, credential).await
    }
}
