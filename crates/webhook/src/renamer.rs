//! Naming policy for repositories and the corrective rename of violators.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use hw_common::{config::RenameConfig, utils::utcnow_ms};
use thiserror::Error;
use tokio_retry2::RetryError;
use tracing::{info, warn};

use crate::{
    event::RepositoryRenameEvent,
    metrics::RENAME_ATTEMPTS,
    retry::{execute_with_retry, rename_retry_strategy},
};

/// GitHub answers 422 when the name is taken or otherwise rejected
pub const UNPROCESSABLE_STATUS: u16 = 422;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenameApiError {
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GitHub API request failed: {0}")]
    Transport(String),

    #[error("GitHub token is not configured")]
    MissingToken,
}

impl RenameApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the message says a previous rename is still being processed
    pub fn is_in_progress(&self, marker: &str) -> bool {
        match self {
            Self::Status { message, .. } => {
                message.to_lowercase().contains(&marker.to_lowercase())
            }
            _ => false,
        }
    }
}

#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn rename_repository(
        &self,
        owner: &str,
        repo: &str,
        new_name: &str,
    ) -> Result<(), RenameApiError>;
}

/// `<words>-<words>-<technology>` style repository names
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    separator: char,
    min_segments: usize,
    allowed_technologies: HashSet<String>,
}

impl NamingPolicy {
    pub fn new<I, S>(separator: char, min_segments: usize, allowed_technologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            separator,
            min_segments,
            allowed_technologies: allowed_technologies
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &RenameConfig) -> Self {
        Self::new(config.separator, config.min_segments, &config.allowed_technologies)
    }

    pub fn is_valid(&self, name: &str) -> bool {
        if name.chars().any(char::is_whitespace) {
            return false;
        }

        let segments: Vec<&str> = name.split(self.separator).collect();
        if segments.len() < self.min_segments {
            return false;
        }

        segments
            .last()
            .is_some_and(|tech| self.allowed_technologies.contains(&tech.to_lowercase()))
    }
}

/// Outcome of checking a rename event against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDecision {
    pub old_name: String,
    pub new_name: String,
    pub owner: String,
    pub repo_full_name: String,
    pub is_valid: bool,
}

impl RenameDecision {
    pub fn evaluate(event: &RepositoryRenameEvent, policy: &NamingPolicy) -> Self {
        let new_name = event.repository.name.clone();
        Self {
            is_valid: policy.is_valid(&new_name),
            old_name: event.old_name().to_string(),
            owner: event.owner().to_string(),
            repo_full_name: event.repository.full_name.clone(),
            new_name,
        }
    }
}

/// Renames repositories that violate the naming policy to a quarantine name
pub struct RepositoryRenamer {
    api: Arc<dyn RepositoryApi>,
    policy: NamingPolicy,
    quarantine_prefix: String,
    in_progress_marker: String,
    max_attempts: u32,
    retry_delay: Duration,
    conflict_retry_delay: Duration,
}

impl RepositoryRenamer {
    pub fn new(api: Arc<dyn RepositoryApi>, config: &RenameConfig) -> Self {
        Self {
            api,
            policy: NamingPolicy::from_config(config),
            quarantine_prefix: config.quarantine_prefix.clone(),
            in_progress_marker: config.in_progress_marker.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            conflict_retry_delay: Duration::from_millis(config.conflict_retry_delay_ms),
        }
    }

    pub fn evaluate(&self, event: &RepositoryRenameEvent) -> RenameDecision {
        RenameDecision::evaluate(event, &self.policy)
    }

    /// True for names this service hands out, which never satisfy the policy
    pub fn is_quarantined(&self, name: &str) -> bool {
        !self.quarantine_prefix.is_empty() && name.starts_with(&self.quarantine_prefix)
    }

    /// Quarantine name unique per millisecond
    pub fn corrective_name(&self) -> String {
        format!("{}{}", self.quarantine_prefix, utcnow_ms())
    }

    /// Rename `owner/repo` to `new_name`.
    ///
    /// Retries with a fixed delay while GitHub reports a rename in progress, up
    /// to the configured attempt count; any other error stops the loop. If the
    /// loop ends on a 422 one more attempt is made after the longer conflict
    /// delay.
    pub async fn rename(&self, owner: &str, repo: &str, new_name: &str) -> Result<(), RenameApiError> {
        let api = &self.api;
        let marker = self.in_progress_marker.as_str();
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let action = move || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match api.rename_repository(owner, repo, new_name).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_in_progress(marker) => {
                    RENAME_ATTEMPTS.with_label_values(&["in_progress"]).inc();
                    warn!(owner, repo, attempt, error = %e, "Rename still in progress, will retry");
                    Err(RetryError::transient(e))
                }
                Err(e) => {
                    RENAME_ATTEMPTS.with_label_values(&["failed"]).inc();
                    Err(RetryError::permanent(e))
                }
            }
        };

        let strategy = rename_retry_strategy(self.max_attempts, self.retry_delay);
        let result = match execute_with_retry(strategy, action).await {
            Err(e) if e.status() == Some(UNPROCESSABLE_STATUS) => {
                warn!(
                    owner,
                    repo,
                    new_name,
                    delay_ms = self.conflict_retry_delay.as_millis() as u64,
                    "Rename rejected as unprocessable, retrying once more"
                );
                tokio::time::sleep(self.conflict_retry_delay).await;
                self.api.rename_repository(owner, repo, new_name).await
            }
            other => other,
        };

        match &result {
            Ok(()) => {
                RENAME_ATTEMPTS.with_label_values(&["succeeded"]).inc();
                info!(owner, repo, new_name, "Repository renamed");
            }
            Err(e) => warn!(owner, repo, new_name, error = %e, "Repository rename gave up"),
        }
        result
    }
}
