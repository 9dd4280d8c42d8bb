mod payload;

pub use payload::*;
use serde::Deserialize;
use serde_json::Value;

use crate::error::WebhookError;

pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

pub const PUSH: &str = "push";
pub const PULL_REQUEST: &str = "pull_request";
pub const ISSUE_COMMENT: &str = "issue_comment";
pub const SECURITY_ADVISORY: &str = "security_advisory";
pub const VULNERABILITY_ALERT: &str = "repository_vulnerability_alert";
pub const DEPLOYMENT_STATUS: &str = "deployment_status";
pub const REPOSITORY: &str = "repository";
/// Audit tag for `repository` events with action `renamed`
pub const REPOSITORY_RENAME: &str = "repository_rename";

const PUSH_FIELDS: &[&str] = &[
    "ref",
    "after",
    "commits",
    "repository.name",
    "repository.full_name",
    "pusher.name",
];

const PULL_REQUEST_FIELDS: &[&str] = &[
    "action",
    "pull_request.number",
    "pull_request.title",
    "pull_request.base.ref",
    "pull_request.head.ref",
    "pull_request.user.login",
    "repository.name",
    "repository.full_name",
];

const ISSUE_COMMENT_FIELDS: &[&str] = &[
    "action",
    "issue.number",
    "comment.body",
    "comment.user.login",
    "repository.name",
    "repository.full_name",
];

const SECURITY_ADVISORY_FIELDS: &[&str] =
    &["action", "security_advisory.summary", "repository.name", "repository.full_name"];

const VULNERABILITY_ALERT_FIELDS: &[&str] =
    &["action", "alert.package_name", "repository.name", "repository.full_name"];

const DEPLOYMENT_STATUS_FIELDS: &[&str] = &[
    "deployment_status.state",
    "deployment_status.environment",
    "repository.name",
    "repository.full_name",
];

const REPOSITORY_RENAME_FIELDS: &[&str] =
    &["action", "changes.repository.name.from", "repository.name", "repository.full_name"];

/// A delivery classified by its `x-github-event` tag
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Push(PushEvent),
    PullRequest(PullRequestEvent),
    IssueComment(IssueCommentEvent),
    SecurityAdvisory(SecurityAdvisoryEvent),
    VulnerabilityAlert(VulnerabilityAlertEvent),
    RepositoryRename(RepositoryRenameEvent),
    DeploymentStatus(DeploymentStatusEvent),
    Unknown(String),
}

impl WebhookEvent {
    /// Classify and validate a payload.
    ///
    /// Unknown tags come back as [`WebhookEvent::Unknown`]; a `repository`
    /// event with any action other than `renamed` is rejected as unhandled.
    pub fn parse(tag: &str, payload: &Value) -> Result<Self, WebhookError> {
        let event = match tag {
            PUSH => Self::Push(extract(payload, PUSH_FIELDS)?),
            PULL_REQUEST => Self::PullRequest(extract(payload, PULL_REQUEST_FIELDS)?),
            ISSUE_COMMENT => Self::IssueComment(extract(payload, ISSUE_COMMENT_FIELDS)?),
            SECURITY_ADVISORY => {
                Self::SecurityAdvisory(extract(payload, SECURITY_ADVISORY_FIELDS)?)
            }
            VULNERABILITY_ALERT => {
                Self::VulnerabilityAlert(extract(payload, VULNERABILITY_ALERT_FIELDS)?)
            }
            DEPLOYMENT_STATUS => {
                Self::DeploymentStatus(extract(payload, DEPLOYMENT_STATUS_FIELDS)?)
            }
            REPOSITORY => {
                let action = required_str(payload, "action")?;
                if action != "renamed" {
                    return Err(WebhookError::UnhandledAction {
                        event: REPOSITORY.to_string(),
                        action: action.to_string(),
                    });
                }
                Self::RepositoryRename(extract(payload, REPOSITORY_RENAME_FIELDS)?)
            }
            other => Self::Unknown(other.to_string()),
        };

        Ok(event)
    }

    /// Tag used for the audit log file of this event
    pub fn tag(&self) -> &str {
        match self {
            Self::Push(_) => PUSH,
            Self::PullRequest(_) => PULL_REQUEST,
            Self::IssueComment(_) => ISSUE_COMMENT,
            Self::SecurityAdvisory(_) => SECURITY_ADVISORY,
            Self::VulnerabilityAlert(_) => VULNERABILITY_ALERT,
            Self::RepositoryRename(_) => REPOSITORY_RENAME,
            Self::DeploymentStatus(_) => DEPLOYMENT_STATUS,
            Self::Unknown(tag) => tag,
        }
    }
}

/// Check every dotted path in `fields` is present and non-null, then deserialize
fn extract<'de, T>(payload: &'de Value, fields: &[&str]) -> Result<T, WebhookError>
where
    T: Deserialize<'de>,
{
    for field in fields {
        if lookup(payload, field).is_none_or(Value::is_null) {
            return Err(WebhookError::MissingField((*field).to_string()));
        }
    }

    T::deserialize(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
}

fn required_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, WebhookError> {
    lookup(payload, field)
        .and_then(Value::as_str)
        .ok_or_else(|| WebhookError::MissingField(field.to_string()))
}

fn lookup<'a>(payload: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(payload, |value, key| value.get(key))
}

/// Strip the `refs/heads/` prefix from a git ref
pub fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}
