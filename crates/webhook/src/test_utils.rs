//! Payload builders and in-memory collaborators for unit tests.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use hw_common::config::RenameConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::{
    audit::AuditLogger,
    cicd::{CiDispatchRequest, CiDispatcher, Workflow},
    dispatch::Dispatcher,
    notify::{Notification, Notifier},
    renamer::{RenameApiError, RepositoryApi, RepositoryRenamer},
};

pub fn push_payload(git_ref: &str, commits: &[&[&str]]) -> Value {
    let commits: Vec<Value> = commits
        .iter()
        .enumerate()
        .map(|(i, added)| {
            json!({
                "id": format!("{i:040x}"),
                "message": format!("commit {i}"),
                "added": added,
                "removed": [],
                "modified": [],
            })
        })
        .collect();

    json!({
        "ref": git_ref,
        "before": "0000000000000000000000000000000000000000",
        "after": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
        "commits": commits,
        "repository": {
            "id": 1296269,
            "name": "hello-world-node",
            "full_name": "octo-org/hello-world-node",
            "owner": { "login": "octo-org" },
        },
        "pusher": { "name": "octocat", "email": "octocat@github.com" },
    })
}

pub fn pull_request_payload(action: &str, merged: bool) -> Value {
    json!({
        "action": action,
        "number": 42,
        "pull_request": {
            "number": 42,
            "title": "Add retry to deploy script",
            "merged": merged,
            "base": { "ref": "main" },
            "head": { "ref": "feature-x" },
            "user": { "login": "octocat" },
        },
        "repository": {
            "name": "hello-world-node",
            "full_name": "octo-org/hello-world-node",
            "owner": { "login": "octo-org" },
        },
    })
}

pub fn rename_payload(old_name: &str, new_name: &str) -> Value {
    json!({
        "action": "renamed",
        "changes": { "repository": { "name": { "from": old_name } } },
        "repository": {
            "name": new_name,
            "full_name": format!("octo-org/{new_name}"),
            "owner": { "login": "octo-org" },
        },
        "sender": { "login": "octocat" },
    })
}

/// Short delays so retry tests finish quickly
pub fn fast_rename_config() -> RenameConfig {
    RenameConfig { retry_delay_ms: 5, conflict_retry_delay_ms: 10, ..RenameConfig::default() }
}

pub fn in_progress() -> RenameApiError {
    RenameApiError::Status {
        status: 422,
        message: "Repository rename is in progress, please try again later".into(),
    }
}

pub async fn temp_audit(dir: &TempDir) -> Arc<AuditLogger> {
    Arc::new(
        AuditLogger::open(dir.path().join("logs"), dir.path().join("public/logs.json"), 100)
            .await
            .unwrap(),
    )
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records like the default one, but reports every delivery as failed
    pub fn failing() -> Self {
        Self { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        self.sent.lock().push(notification.clone());
        if self.fail {
            eyre::bail!("channel unavailable");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCi {
    requests: Mutex<Vec<CiDispatchRequest>>,
    fail: bool,
}

impl RecordingCi {
    pub fn failing() -> Self {
        Self { requests: Mutex::new(Vec::new()), fail: true }
    }

    pub fn requests(&self) -> Vec<CiDispatchRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CiDispatcher for RecordingCi {
    async fn dispatch(&self, request: &CiDispatchRequest) -> eyre::Result<Workflow> {
        self.requests.lock().push(request.clone());
        if self.fail {
            eyre::bail!("repository dispatch returned 401 Unauthorized: Bad credentials");
        }
        Ok(request.workflow())
    }
}

/// Answers rename calls from a script, `Ok(())` once the script runs out
#[derive(Default)]
pub struct ScriptedRepositoryApi {
    script: Mutex<VecDeque<Result<(), RenameApiError>>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedRepositoryApi {
    pub fn new(script: Vec<Result<(), RenameApiError>>) -> Self {
        Self { script: Mutex::new(script.into()), calls: Mutex::default() }
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RepositoryApi for ScriptedRepositoryApi {
    async fn rename_repository(
        &self,
        owner: &str,
        repo: &str,
        new_name: &str,
    ) -> Result<(), RenameApiError> {
        self.calls.lock().push((owner.to_string(), repo.to_string(), new_name.to_string()));
        self.script.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Dispatcher wired to in-memory collaborators and a temp log directory
pub struct TestDispatcher {
    pub dir: TempDir,
    pub audit: Arc<AuditLogger>,
    pub notifier: Arc<RecordingNotifier>,
    pub ci: Arc<RecordingCi>,
    pub api: Arc<ScriptedRepositoryApi>,
    pub dispatcher: Dispatcher,
}

impl TestDispatcher {
    pub async fn new() -> Self {
        Self::with(
            RecordingNotifier::default(),
            RecordingCi::default(),
            ScriptedRepositoryApi::default(),
        )
        .await
    }

    pub async fn with(
        notifier: RecordingNotifier,
        ci: RecordingCi,
        api: ScriptedRepositoryApi,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let audit = temp_audit(&dir).await;
        let notifier = Arc::new(notifier);
        let ci = Arc::new(ci);
        let api = Arc::new(api);
        let renamer = Arc::new(RepositoryRenamer::new(api.clone(), &fast_rename_config()));
        let dispatcher = Dispatcher::new(audit.clone(), notifier.clone(), ci.clone(), renamer);

        Self { dir, audit, notifier, ci, api, dispatcher }
    }

    /// Parsed lines of `<log_dir>/<event>.log`, empty if never written
    pub fn log_lines(&self, event: &str) -> Vec<Value> {
        match std::fs::read_to_string(self.audit.event_log_path(event)) {
            Ok(raw) => raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
