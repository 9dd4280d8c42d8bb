use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::Dispatcher;
use crate::{
    cicd::CiDispatchRequest,
    error::WebhookError,
    event::{branch_name, Commit, PushEvent, PUSH},
    notify::Notification,
};

/// Repository paths whose addition or modification raises a security alert
pub const SENSITIVE_FILES: [&str; 4] = [".env", "config.json", "secrets.yaml", "credentials.json"];

/// Audit tag of the entry written when sensitive files are pushed
pub const SECURITY_ALERT: &str = "security_alert";

/// Sensitive paths touched by `commits`, deduplicated and sorted.
///
/// Only exact matches count: `packages/ui/config.json` is not `config.json`.
pub fn sensitive_files(commits: &[Commit]) -> Vec<String> {
    commits
        .iter()
        .flat_map(|commit| commit.added.iter().chain(&commit.modified))
        .filter(|path| SENSITIVE_FILES.contains(&path.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Dispatcher {
    pub(super) async fn handle_push(
        &self,
        event: &PushEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        let branch = branch_name(&event.git_ref);
        let repository = &event.repository.full_name;
        let pusher = &event.pusher.name;

        info!(%repository, branch, %pusher, commits = event.commits.len(), "Push received");
        self.audit.log_event(PUSH, payload).await?;

        let detected = sensitive_files(&event.commits);
        if !detected.is_empty() {
            warn!(%repository, branch, files = ?detected, "Sensitive files pushed");

            self.notify(Notification::high(
                format!("Sensitive files pushed to {repository}"),
                format!(
                    "🚨 Sensitive file changes detected in {repository} on branch {branch} by \
                     {pusher}.\nFiles: {}",
                    detected.join(", ")
                ),
            ))
            .await;

            let alert = json!({
                "repository": repository,
                "branch": branch,
                "pusher": pusher,
                "detectedFiles": detected,
            });
            self.audit.log_event(SECURITY_ALERT, &alert).await?;
        }

        let request = CiDispatchRequest {
            repository: repository.clone(),
            branch: branch.to_string(),
            commit: event.after.clone(),
            author: pusher.clone(),
        };
        self.ci.dispatch(&request).await.map_err(|e| WebhookError::CiDispatch(format!("{e:#}")))?;

        Ok(())
    }
}
