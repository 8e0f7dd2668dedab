use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::db::{Database, DbError};
use crate::hosting::DEFAULT_API_BASE;
use crate::llm::{HttpCompletionClient, LlmConfig, LlmError};
use crate::models::Author;

pub const API_KEY_ENV: &str = "WORKBENCH_API_KEY";
pub const GIT_TOKEN_ENV: &str = "WORKBENCH_GIT_TOKEN";

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_RETRY_MAX_ELAPSED_MS: u64 = 30_000;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a coding assistant working inside a live project workspace. \
Use the provided tools to inspect and change files. Paths are absolute from the workspace root, e.g. /src/index.js. \
Read a file before editing it; edit_file replaces the whole file content. Explain briefly what you are about to do \
before calling tools, and summarize the result when you are done.";

const DEFAULT_SCAFFOLD_PATHS: [&str; 4] = ["/package-lock.json", "/yarn.lock", "/pnpm-lock.yaml", "/.sandbox/"];

#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub llm: LlmConfig,
  pub api_key: Option<String>,
  pub system_prompt: String,
  pub max_tool_rounds: usize,
  pub settle_delay: Duration,
  pub retry_max_elapsed: Duration,
  pub workdir: PathBuf,
  pub repo_url: Option<String>,
  pub author: Author,
  pub hosting_api_base: String,
  pub scaffold_paths: Vec<String>,
  pub git_token: Option<String>,
}

fn non_empty(settings: &HashMap<String, String>, key: &str) -> Option<String> {
  settings.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_non_empty(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn build_llm_config(settings: &HashMap<String, String>) -> LlmConfig {
  LlmConfig {
    provider_name: non_empty(settings, "provider_name").unwrap_or_else(|| "anthropic".to_string()),
    base_url: non_empty(settings, "base_url").unwrap_or_else(|| "https://api.anthropic.com".to_string()),
    model: non_empty(settings, "model").unwrap_or_else(|| "claude-3-5-sonnet-latest".to_string()),
    temperature: settings.get("temperature").and_then(|s| s.parse().ok()).unwrap_or(0.2),
    max_tokens: settings.get("max_tokens").and_then(|s| s.parse().ok()).unwrap_or(4096),
    extra_headers: settings
      .get("extra_headers_json")
      .and_then(|s| serde_json::from_str(s).ok())
      .unwrap_or_else(|| json!({})),
  }
}

/// Settings value first, then the environment.
pub fn get_api_key(settings: &HashMap<String, String>) -> Option<String> {
  non_empty(settings, "api_key").or_else(|| env_non_empty(API_KEY_ENV))
}

impl EngineConfig {
  pub fn from_settings(settings: &HashMap<String, String>) -> Self {
    let scaffold_paths = match non_empty(settings, "scaffold_paths") {
      Some(list) => list.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect(),
      None => DEFAULT_SCAFFOLD_PATHS.iter().map(|p| p.to_string()).collect(),
    };

    Self {
      llm: build_llm_config(settings),
      api_key: get_api_key(settings),
      system_prompt: non_empty(settings, "system_prompt").unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
      max_tool_rounds: settings
        .get("max_tool_rounds")
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
      settle_delay: Duration::from_millis(
        settings.get("settle_delay_ms").and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SETTLE_DELAY_MS),
      ),
      retry_max_elapsed: Duration::from_millis(
        settings
          .get("retry_max_elapsed_ms")
          .and_then(|s| s.parse().ok())
          .unwrap_or(DEFAULT_RETRY_MAX_ELAPSED_MS),
      ),
      workdir: non_empty(settings, "workdir").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("workspace")),
      repo_url: non_empty(settings, "repo_url"),
      author: Author {
        name: non_empty(settings, "author_name").unwrap_or_else(|| "Workbench".to_string()),
        email: non_empty(settings, "author_email").unwrap_or_else(|| "workbench@localhost".to_string()),
      },
      hosting_api_base: non_empty(settings, "hosting_api_base").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
      scaffold_paths,
      git_token: env_non_empty(GIT_TOKEN_ENV),
    }
  }

  pub fn load(db: &Database) -> Result<Self, DbError> {
    Ok(Self::from_settings(&db.settings()?))
  }

  /// Completion client over `llm`, with the configured retry budget.
  pub fn completion_client(&self) -> Result<HttpCompletionClient, LlmError> {
    Ok(
      HttpCompletionClient::new(self.llm.clone(), self.api_key.clone().unwrap_or_default())?
        .with_max_elapsed(self.retry_max_elapsed),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_for_missing_keys() {
    let config = EngineConfig::from_settings(&HashMap::new());
    assert_eq!(config.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
    assert_eq!(config.settle_delay, Duration::from_millis(100));
    assert_eq!(config.retry_max_elapsed, Duration::from_secs(30));
    assert_eq!(config.llm.max_tokens, 4096);
    assert!(config.scaffold_paths.contains(&"/package-lock.json".to_string()));
    assert_eq!(config.hosting_api_base, "https://api.github.com");
  }

  #[test]
  fn settings_override_defaults() {
    let settings: HashMap<String, String> = [
      ("model", "m"),
      ("temperature", "0.7"),
      ("max_tool_rounds", "3"),
      ("settle_delay_ms", "0"),
      ("retry_max_elapsed_ms", "500"),
      ("api_key", "k"),
      ("scaffold_paths", "/a.lock, /meta/"),
      ("extra_headers_json", r#"{"x-team":"core"}"#),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = EngineConfig::from_settings(&settings);
    assert_eq!(config.llm.model, "m");
    assert_eq!(config.llm.temperature, 0.7);
    assert_eq!(config.max_tool_rounds, 3);
    assert!(config.settle_delay.is_zero());
    assert_eq!(config.retry_max_elapsed, Duration::from_millis(500));
    assert_eq!(config.api_key.as_deref(), Some("k"));
    assert_eq!(config.scaffold_paths, vec!["/a.lock", "/meta/"]);
    assert_eq!(config.llm.extra_headers["x-team"], "core");
  }

  #[test]
  fn zero_rounds_falls_back_to_default() {
    let settings = HashMap::from([("max_tool_rounds".to_string(), "0".to_string())]);
    assert_eq!(EngineConfig::from_settings(&settings).max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
  }
}
