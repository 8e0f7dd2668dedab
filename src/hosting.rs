use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::errors::EngineError;
use crate::models::PullRequestRecord;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_BASE_BRANCH: &str = "main";

#[derive(Serialize)]
struct PullRequestBody<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct PullRequestResponse {
    number: u64,
    html_url: String,
}

/// Client for the code-hosting REST API.
#[derive(Clone)]
pub struct HostingClient {
    http: Client,
    api_base: String,
}

/// Split `owner/repo`, rejecting anything else.
pub fn parse_repo(repo: &str) -> Result<(&str, &str), EngineError> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok((owner, name)),
        _ => Err(EngineError::validation(format!("repository must be 'owner/repo', got '{}'", repo))),
    }
}

impl HostingClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self, EngineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EngineError::external(e.to_string()))?;
        Ok(Self { http, api_base: api_base.into() })
    }

    pub async fn create_pull_request(
        &self,
        repo: &str,
        branch: &str,
        title: &str,
        body: &str,
        credential: &str,
    ) -> Result<PullRequestRecord, EngineError> {
        let (owner, name) = parse_repo(repo)?;
        if credential.is_empty() {
            return Err(EngineError::Auth("a hosting credential is required".into()));
        }

        let url = format!("{}/repos/{}/{}/pulls", self.api_base.trim_end_matches('/'), owner, name);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", credential))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("workbench/", env!("CARGO_PKG_VERSION")))
            .json(&PullRequestBody { title, head: branch, base: DEFAULT_BASE_BRANCH, body })
            .send()
            .await
            .map_err(|e| EngineError::external(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::ExternalService { status: Some(status.as_u16()), message: text });
        }

        let parsed: PullRequestResponse =
            response.json().await.map_err(|e| EngineError::external(format!("invalid pull request response: {}", e)))?;

        info!(repo, branch, number = parsed.number, "pull request created");
        Ok(PullRequestRecord { number: parsed.number, url: parsed.html_url })
    }
}
