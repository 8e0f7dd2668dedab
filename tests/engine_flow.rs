use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workbench_lib::changes::DiffOutcome;
use workbench_lib::config::EngineConfig;
use workbench_lib::db::Database;
use workbench_lib::models::{MessageBody, ToolStatus};
use workbench_lib::vcs::GitCli;
use workbench_lib::workflows::SubmitOutcome;
use workbench_lib::workspace::NullSandbox;
use workbench_lib::workspace_tools::safety::{has_git, safe_spawn};
use workbench_lib::Workbench;

async fn git(dir: &Path, args: &[&str]) {
    let (_, stderr, code) = safe_spawn("git", args, dir, 30).await.unwrap();
    assert_eq!(code, 0, "git {:?}: {}", args, stderr);
}

async fn seeded_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--quiet"]).await;
    git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]).await;
    std::fs::write(dir.path().join("a.js"), "1\n2\n").unwrap();
    git(dir.path(), &["add", "a.js"]).await;
    git(dir.path(), &["-c", "user.name=Seed", "-c", "user.email=seed@example.com", "commit", "--quiet", "-m", "seed"])
        .await;
    dir
}

/// The model edits `/a.js` once, then answers in text after seeing the
/// tool result.
async fn scripted_model() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains(r#""type":"tool_result""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "Changed line two." }],
            "stop_reason": "end_turn"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "text", "text": "Editing a.js." },
                { "type": "tool_use", "id": "toolu_1", "name": "edit_file",
                  "input": { "file_path": "/a.js", "content": "1\n3\n" } }
            ],
            "stop_reason": "tool_use"
        })))
        .mount(&server)
        .await;
    server
}

fn config(server: &MockServer, workdir: &Path) -> EngineConfig {
    let settings: HashMap<String, String> = [
        ("base_url", server.uri()),
        ("api_key", "test-key".to_string()),
        ("settle_delay_ms", "0".to_string()),
        ("retry_max_elapsed_ms", "1000".to_string()),
        ("workdir", workdir.to_string_lossy().to_string()),
        ("author_name", "Workbench Test".to_string()),
        ("author_email", "bench@example.com".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    EngineConfig::from_settings(&settings)
}

fn workbench(config: EngineConfig, db: Database) -> Workbench {
    let client = config.completion_client().unwrap();
    let vcs = GitCli::new(config.workdir.clone()).unwrap();
    Workbench::new(config, db, Arc::new(client), Arc::new(vcs), Arc::new(NullSandbox)).unwrap()
}

#[tokio::test]
async fn turn_edits_workspace_then_diff_and_commit() {
    if !has_git() {
        return;
    }
    let repo = seeded_repo().await;
    let server = scripted_model().await;
    let home = TempDir::new().unwrap();
    let db = Database::open(home.path().join("workbench.sqlite")).unwrap();
    let bench = workbench(config(&server, repo.path()), db.clone());

    assert_eq!(bench.open_repository(None).await.unwrap(), 1);
    assert_eq!(bench.diff().await.unwrap(), DiffOutcome::NoChanges);

    assert_eq!(bench.submit("change line two to three").await, SubmitOutcome::Started);
    let messages = bench.messages();
    let result = messages
        .iter()
        .find_map(|m| match &m.body {
            MessageBody::ToolResult { tool_call_id, result } if tool_call_id == "toolu_1" => Some(result.clone()),
            _ => None,
        })
        .expect("tool result recorded");
    assert_eq!(result.status, ToolStatus::Success);
    assert_eq!(result.detail("old_content"), Some(&json!("1\n2\n")));
    assert!(matches!(&messages.last().unwrap().body,
        MessageBody::AssistantMessage { content } if content == "Changed line two."));

    let rendered = bench.diff().await.unwrap().render();
    assert!(rendered.contains("--- a/a.js\n+++ b/a.js\n@@ -1,2 +1,2 @@\n 1\n-2\n+3\n"), "{}", rendered);

    let record = bench.commit("Change line two", "Requested in chat.").await.unwrap();
    assert_eq!(record.branch, "main");
    assert_eq!(record.paths, vec!["/a.js"]);
    assert_eq!(record.author.email, "bench@example.com");
    assert_eq!(bench.diff().await.unwrap(), DiffOutcome::NoChanges);

    let err = bench.commit("Again", "").await.unwrap_err();
    assert_eq!(err.to_string(), "validation error: no changes to commit");

    assert_eq!(bench.list_tool_calls().unwrap().len(), 1);

    assert_eq!(bench.create_branch("feature").await.unwrap(), "feature");
    assert_eq!(bench.create_branch("feature").await.unwrap(), "feature");
    let statuses = bench.status().await.unwrap();
    assert!(statuses.is_empty(), "{:?}", statuses);
}

#[tokio::test]
async fn conversation_survives_restart() {
    if !has_git() {
        return;
    }
    let repo = seeded_repo().await;
    let server = scripted_model().await;
    let home = TempDir::new().unwrap();
    let db = Database::open(home.path().join("workbench.sqlite")).unwrap();

    let before = {
        let bench = workbench(config(&server, repo.path()), db.clone());
        bench.open_repository(None).await.unwrap();
        bench.submit("change line two to three").await;
        bench.messages()
    };

    let bench = workbench(config(&server, repo.path()), db);
    assert_eq!(bench.messages(), before);

    assert_eq!(bench.list_tool_calls().unwrap().len(), 1);

    bench.reset_history().unwrap();
    assert_eq!(bench.messages().len(), 1);
}

#[tokio::test]
async fn settings_are_stored_for_the_next_start() {
    if !has_git() {
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    let db = Database::open(home.path().join("workbench.sqlite")).unwrap();
    let bench = workbench(config(&server, workdir.path()), db.clone());

    bench.set_setting("max_tool_rounds", "7").unwrap();
    assert_eq!(bench.get_setting("max_tool_rounds").unwrap().as_deref(), Some("7"));
    assert_eq!(bench.list_settings().unwrap().len(), 1);
    assert!(bench.set_setting(" ", "x").is_err());
    assert_eq!(EngineConfig::load(&db).unwrap().max_tool_rounds, 7);
}
