use std::sync::Arc;
use tracing::info;

use crate::changes::{ChangeEngine, DiffOutcome};
use crate::config::EngineConfig;
use crate::db::Database;
use crate::errors::EngineError;
use crate::hosting::HostingClient;
use crate::llm::CompletionClient;
use crate::models::*;
use crate::sync::{read_workdir, Synchronizer};
use crate::vcs::VersionControl;
use crate::workflows::{Conversation, ConversationSettings, SubmitOutcome};
use crate::workspace::{Sandbox, SessionStore};
use crate::workspace_tools::{list_tool_calls, ToolDispatcher};

/// Everything a front end needs: the conversation, the shared workspace and
/// the change engine, wired from one config.
pub struct Workbench {
  config: EngineConfig,
  db: Database,
  store: SessionStore,
  sandbox: Arc<dyn Sandbox>,
  conversation: Conversation,
  changes: ChangeEngine,
}

impl Workbench {
  pub fn new(
    config: EngineConfig,
    db: Database,
    client: Arc<dyn CompletionClient>,
    vcs: Arc<dyn VersionControl>,
    sandbox: Arc<dyn Sandbox>,
  ) -> Result<Self, EngineError> {
    let store = SessionStore::new();
    let dispatcher = ToolDispatcher::new(store.clone(), sandbox.clone(), config.settle_delay);
    let conversation = Conversation::restore(
      client,
      dispatcher,
      ConversationSettings { system_prompt: config.system_prompt.clone(), max_tool_rounds: config.max_tool_rounds },
      db.clone(),
    );

    let synchronizer = Arc::new(Synchronizer::new(store.clone(), vcs.workdir(), config.scaffold_paths.clone()));
    let hosting = HostingClient::new(config.hosting_api_base.clone())?;
    let changes = ChangeEngine::new(vcs, synchronizer, store.clone(), hosting, config.author.clone());

    Ok(Self { config, db, store, sandbox, conversation, changes })
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn store(&self) -> &SessionStore {
    &self.store
  }

  pub fn list_settings(&self) -> Result<Vec<SettingsKV>, EngineError> {
    Ok(self.db.list_settings()?)
  }

  pub fn get_setting(&self, key: &str) -> Result<Option<String>, EngineError> {
    Ok(self.db.get_setting(key)?)
  }

  /// Stored for the next start; the running engine keeps its config.
  pub fn set_setting(&self, key: &str, value: &str) -> Result<(), EngineError> {
    if key.trim().is_empty() {
      return Err(EngineError::validation("setting key must not be empty"));
    }
    Ok(self.db.set_setting(key.trim(), value)?)
  }

  /// Clone `url` when the working directory is not yet a repository, then
  /// load its files into the buffer and sandbox. Returns the file count.
  pub async fn open_repository(&self, url: Option<&str>) -> Result<usize, EngineError> {
    let vcs = self.changes.vcs();
    if !vcs.is_repository().await? {
      let url = url.ok_or_else(|| EngineError::validation("working directory is not a repository and no url was given"))?;
      vcs.clone_repository(url).await?;
    }

    let files = read_workdir(vcs.workdir());
    for (path, content) in &files {
      self.sandbox.add_file(path, content);
    }
    self.sandbox.rebuild();

    let count = files.len();
    self.store.load(files).await;
    info!(files = count, workdir = %vcs.workdir().display(), "repository opened");
    Ok(count)
  }

  pub async fn submit(&self, text: impl Into<String>) -> SubmitOutcome {
    self.conversation.submit(text).await
  }

  pub fn messages(&self) -> Vec<Message> {
    self.conversation.messages()
  }

  pub fn is_busy(&self) -> bool {
    self.conversation.is_busy()
  }

  pub fn reset_history(&self) -> Result<(), EngineError> {
    self.conversation.reset()
  }

  pub fn list_tool_calls(&self) -> Result<Vec<ToolCallRow>, EngineError> {
    Ok(list_tool_calls(&self.db, self.conversation.session_id())?)
  }

  pub async fn status(&self) -> Result<Vec<StatusEntry>, EngineError> {
    self.changes.compute_status().await
  }

  pub async fn diff(&self) -> Result<DiffOutcome, EngineError> {
    self.changes.generate_diff().await
  }

  pub async fn commit(&self, title: &str, description: &str) -> Result<CommitRecord, EngineError> {
    self.changes.commit(title, description).await
  }

  pub async fn create_branch(&self, name: &str) -> Result<String, EngineError> {
    self.changes.create_branch(name).await
  }

  /// Push with `credential`, or the configured token when none is given.
  pub async fn push(&self, branch: &str, credential: Option<&str>) -> Result<String, EngineError> {
    let credential = credential.or(self.config.git_token.as_deref());
    self.changes.push(branch, credential).await
  }

  pub async fn create_pull_request(
    &self,
    repo: &str,
    branch: &str,
    title: &str,
    body: &str,
    credential: &str,
  ) -> Result<PullRequestRecord, EngineError> {
    self.changes.create_pull_request(repo, branch, title, body, credential).await
  }
}
