//! Minimal GitHub REST client for the two calls the service makes.

use async_trait::async_trait;
use eyre::{bail, WrapErr};
use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    cicd::{CiDispatchRequest, CiDispatcher, Workflow},
    renamer::{RenameApiError, RepositoryApi},
};

pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
/// `event_type` of the repository dispatch that starts CI
pub const CI_EVENT_TYPE: &str = "ci-cd-trigger";

pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(client: Client, api_url: impl Into<String>, token: Option<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let token = token.filter(|t| !t.is_empty());
        Self { client, api_url, token }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_url))
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(token)
    }
}

/// Prefer GitHub's `message` field, fall back to the raw body
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text)
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn rename_repository(
        &self,
        owner: &str,
        repo: &str,
        new_name: &str,
    ) -> Result<(), RenameApiError> {
        let token = self.token.as_deref().ok_or(RenameApiError::MissingToken)?;

        debug!(owner, repo, new_name, "Sending rename request");
        let response = self
            .request(reqwest::Method::PATCH, &format!("/repos/{owner}/{repo}"), token)
            .json(&json!({ "name": new_name }))
            .send()
            .await
            .map_err(|e| RenameApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(RenameApiError::Status { status: status.as_u16(), message: error_message(response).await })
    }
}

#[async_trait]
impl CiDispatcher for GitHubClient {
    async fn dispatch(&self, request: &CiDispatchRequest) -> eyre::Result<Workflow> {
        let Some(token) = self.token.as_deref() else {
            bail!("GitHub token is not configured");
        };

        let workflow = request.workflow();
        let body = json!({
            "event_type": CI_EVENT_TYPE,
            "client_payload": {
                "branch": request.branch,
                "commit": request.commit,
                "author": request.author,
                "workflow": workflow.file_name(),
            },
        });

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{}/dispatches", request.repository),
                token,
            )
            .json(&body)
            .send()
            .await
            .wrap_err("Failed to send repository dispatch")?;

        let status = response.status();
        if !status.is_success() {
            bail!("repository dispatch returned {status}: {}", error_message(response).await);
        }

        info!(
            repository = %request.repository,
            branch = %request.branch,
            workflow = workflow.file_name(),
            "CI/CD pipeline triggered"
        );
        Ok(workflow)
    }
}
