pub mod git;

use async_trait::async_trait;
use std::path::Path;

use crate::errors::EngineError;
use crate::models::{Author, StatusEntry};

pub use git::GitCli;

/// Version-control primitives keyed by a working directory. Paths are the
/// `/`-rooted workspace form.
#[async_trait]
pub trait VersionControl: Send + Sync {
    fn workdir(&self) -> &Path;

    async fn is_repository(&self) -> Result<bool, EngineError>;

    /// Clone `url` into the (empty or missing) working directory.
    async fn clone_repository(&self, url: &str) -> Result<(), EngineError>;

    /// Paths whose head, working copy and stage are not all unmodified.
    async fn status_matrix(&self) -> Result<Vec<StatusEntry>, EngineError>;

    /// Content of `path` in HEAD, `None` when absent or there is no HEAD yet.
    async fn read_head_blob(&self, path: &str) -> Result<Option<String>, EngineError>;

    /// Stage the working-copy state of `path`, including deletion.
    async fn add(&self, path: &str) -> Result<(), EngineError>;

    /// Commit the stage and return the new commit id.
    async fn commit(&self, message: &str, author: &Author) -> Result<String, EngineError>;

    async fn current_branch(&self) -> Result<Option<String>, EngineError>;

    async fn branch_exists(&self, name: &str) -> Result<bool, EngineError>;

    async fn create_branch(&self, name: &str) -> Result<(), EngineError>;

    async fn checkout(&self, name: &str) -> Result<(), EngineError>;

    async fn push(&self, branch: &str, credential: &str) -> Result<(), EngineError>;
}
