//! The subset of GitHub's webhook payload schemas this service reads.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub owner: Option<Account>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pusher {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Head commit after the push
    pub after: String,
    pub commits: Vec<Commit>,
    pub repository: Repository,
    pub pusher: Pusher,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub base: BranchRef,
    pub head: BranchRef,
    pub user: Account,
    #[serde(default)]
    pub merged: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub body: String,
    pub user: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityAdvisory {
    pub summary: String,
    #[serde(default)]
    pub ghsa_id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityAdvisoryEvent {
    pub action: String,
    pub security_advisory: SecurityAdvisory,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VulnerabilityAlert {
    pub package_name: String,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VulnerabilityAlertEvent {
    pub action: String,
    pub alert: VulnerabilityAlert,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStatus {
    pub state: String,
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStatusEvent {
    pub deployment_status: DeploymentStatus,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameChange {
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryChange {
    pub name: NameChange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameChanges {
    pub repository: RepositoryChange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRenameEvent {
    pub action: String,
    pub changes: RenameChanges,
    pub repository: Repository,
}

impl RepositoryRenameEvent {
    pub fn old_name(&self) -> &str {
        &self.changes.repository.name.from
    }

    /// Owner login, falling back to the first half of `full_name`
    pub fn owner(&self) -> &str {
        match &self.repository.owner {
            Some(owner) => &owner.login,
            None => self.repository.full_name.split('/').next().unwrap_or_default(),
        }
    }
}
