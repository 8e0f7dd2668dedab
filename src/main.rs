use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use workbench_lib::changes::DiffOutcome;
use workbench_lib::config::EngineConfig;
use workbench_lib::db::{default_path, Database};
use workbench_lib::models::{Message, MessageBody};
use workbench_lib::vcs::GitCli;
use workbench_lib::workspace::NullSandbox;
use workbench_lib::{EngineError, Workbench};

const HELP: &str = "\
Type a request to send it to the assistant. Commands:
  :status                      working-copy status
  :diff                        diff of the workspace against HEAD
  :commit <title> [| <body>]   commit the workspace
  :branch <name>               create or switch branch
  :push <branch> [token]       push a branch to origin
  :pr <owner/repo> <branch> <title>
  :tools                       tool calls of this session
  :settings                    stored settings
  :set <key> [value]           show or store a setting (applies on restart)
  :reset                       clear the conversation
  :quit";

fn print_message(message: &Message) {
    match &message.body {
        MessageBody::UserMessage { .. } => {}
        MessageBody::AssistantMessage { content } => println!("assistant> {}", content),
        MessageBody::ToolCall { tool_call } => println!("  -> {} {}", tool_call.name, tool_call.arguments),
        MessageBody::ToolResult { result, .. } => match (&result.message, &result.error) {
            (_, Some(error)) => println!("  <- error: {}", error),
            (Some(message), None) => println!("  <- {}", message),
            (None, None) => println!("  <- ok"),
        },
    }
}

async fn run_command(bench: &Workbench, line: &str, credential: &mut Option<String>) -> Result<bool, EngineError> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        ":quit" | ":q" => return Ok(false),
        ":help" => println!("{}", HELP),
        ":status" => {
            for entry in bench.status().await? {
                println!("{:?}/{:?}/{:?} {}", entry.head, entry.workdir, entry.stage, entry.path);
            }
        }
        ":diff" => match bench.diff().await? {
            DiffOutcome::NoChanges => println!("No changes."),
            diff => print!("{}", diff.render()),
        },
        ":commit" => {
            let (title, body) = rest.split_once('|').unwrap_or((rest, ""));
            let record = bench.commit(title, body).await?;
            println!("committed {} on {} ({} files)", record.id, record.branch, record.paths.len());
        }
        ":branch" => println!("on branch {}", bench.create_branch(rest).await?),
        ":push" => {
            let mut parts = rest.split_whitespace();
            let branch = parts.next().unwrap_or_default();
            let used = bench.push(branch, parts.next().or(credential.as_deref())).await?;
            *credential = Some(used);
            println!("pushed {}", branch);
        }
        ":pr" => {
            let mut parts = rest.splitn(3, ' ');
            let (repo, branch, title) = (
                parts.next().unwrap_or_default(),
                parts.next().unwrap_or_default(),
                parts.next().unwrap_or_default(),
            );
            let token = credential
                .clone()
                .or_else(|| bench.config().git_token.clone())
                .ok_or_else(|| EngineError::Auth("push first, or set WORKBENCH_GIT_TOKEN".into()))?;
            let pr = bench.create_pull_request(repo, branch, title, "", &token).await?;
            println!("opened #{} {}", pr.number, pr.url);
        }
        ":tools" => {
            for row in bench.list_tool_calls()? {
                println!("{} {} {}", row.created_at, row.name, row.args_json);
            }
        }
        ":settings" => {
            for kv in bench.list_settings()? {
                println!("{} = {}", kv.key, kv.value);
            }
        }
        ":set" => match rest.split_once(' ') {
            Some((key, value)) => {
                bench.set_setting(key, value.trim())?;
                println!("saved {}; restart to apply", key);
            }
            None => match bench.get_setting(rest)? {
                Some(value) => println!("{} = {}", rest, value),
                None => println!("{} is not set", rest),
            },
        },
        ":reset" => {
            bench.reset_history()?;
            println!("conversation cleared");
        }
        other => println!("unknown command {}; try :help", other),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init();

    let db = Database::open(default_path())?;
    info!(path = %db.path().display(), "database opened");
    let config = EngineConfig::load(&db)?;

    let client = config.completion_client()?;
    let vcs = GitCli::new(config.workdir.clone())?;
    let repo_url = config.repo_url.clone();
    let bench = Workbench::new(config, db, Arc::new(client), Arc::new(vcs), Arc::new(NullSandbox))?;

    let files = bench.open_repository(repo_url.as_deref()).await?;
    println!("loaded {} files; :help for commands", files);
    for message in bench.messages() {
        print_message(&message);
    }

    let mut credential = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(':') {
            match run_command(&bench, line, &mut credential).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("error: {}", e),
            }
            continue;
        }

        let seen = bench.messages().len();
        bench.submit(line).await;
        for message in bench.messages().iter().skip(seen) {
            print_message(message);
        }
    }

    Ok(())
}
