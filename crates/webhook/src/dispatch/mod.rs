//! Routes verified deliveries to their handler.
//!
//! Every handler appends its audit entry first and then runs its side effects
//! independently: a failed notification is recorded and ignored, a failed CI
//! dispatch or rename fails the delivery without undoing what already ran.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    audit::AuditLogger,
    cicd::CiDispatcher,
    error::WebhookError,
    event::WebhookEvent,
    metrics::{EVENTS_RECEIVED, EVENTS_REJECTED},
    notify::{Notification, Notifier},
    renamer::RepositoryRenamer,
};

mod activity;
mod pull_request;
mod push;
mod rename;

pub use push::{sensitive_files, SECURITY_ALERT, SENSITIVE_FILES};

pub struct Dispatcher {
    audit: Arc<AuditLogger>,
    notifier: Arc<dyn Notifier>,
    ci: Arc<dyn CiDispatcher>,
    renamer: Arc<RepositoryRenamer>,
}

impl Dispatcher {
    pub fn new(
        audit: Arc<AuditLogger>,
        notifier: Arc<dyn Notifier>,
        ci: Arc<dyn CiDispatcher>,
        renamer: Arc<RepositoryRenamer>,
    ) -> Self {
        Self { audit, notifier, ci, renamer }
    }

    pub fn audit(&self) -> &Arc<AuditLogger> {
        &self.audit
    }

    /// Run the handler for `tag` over a payload whose signature was already checked
    pub async fn handle(&self, tag: &str, payload: &Value) -> Result<(), WebhookError> {
        let event = match WebhookEvent::parse(tag, payload) {
            Ok(WebhookEvent::Unknown(tag)) => {
                warn!(event = %tag, "Unhandled event type");
                EVENTS_REJECTED.with_label_values(&["unhandled"]).inc();
                return Err(WebhookError::UnhandledEvent(tag));
            }
            Ok(event) => event,
            Err(e) if e.is_unhandled() => {
                warn!(event = tag, error = %e, "Unhandled event action");
                EVENTS_REJECTED.with_label_values(&["unhandled"]).inc();
                return Err(e);
            }
            Err(e) => {
                self.record_failure(tag, &e, payload).await;
                return Err(e);
            }
        };

        EVENTS_RECEIVED.with_label_values(&[event.tag()]).inc();
        info!(event = event.tag(), "Processing event");

        let result = match &event {
            WebhookEvent::Push(push) => self.handle_push(push, payload).await,
            WebhookEvent::PullRequest(pr) => self.handle_pull_request(pr, payload).await,
            WebhookEvent::IssueComment(comment) => {
                self.handle_issue_comment(comment, payload).await
            }
            WebhookEvent::SecurityAdvisory(advisory) => {
                self.handle_security_advisory(advisory, payload).await
            }
            WebhookEvent::VulnerabilityAlert(alert) => {
                self.handle_vulnerability_alert(alert, payload).await
            }
            WebhookEvent::DeploymentStatus(status) => {
                self.handle_deployment_status(status, payload).await
            }
            WebhookEvent::RepositoryRename(rename) => self.handle_rename(rename, payload).await,
            WebhookEvent::Unknown(_) => Ok(()),
        };

        match &result {
            Ok(()) => info!(event = event.tag(), "Event processed"),
            Err(e) => self.record_failure(event.tag(), e, payload).await,
        }
        result
    }

    /// Log a failed delivery to `errors.log`, a failing error log only goes to tracing
    async fn record_failure(&self, tag: &str, err: &WebhookError, payload: &Value) {
        let reason = if err.is_validation() { "validation" } else { "internal" };
        EVENTS_REJECTED.with_label_values(&[reason]).inc();
        error!(event = tag, error = %err, "Failed to handle event");

        let message = format!("Error handling {tag} event: {err}");
        if let Err(log_err) = self.audit.log_error(&message, payload).await {
            error!(error = %log_err, "Failed to write error log");
        }
    }

    /// Best-effort delivery, failures are recorded but never propagate
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.send(&notification).await {
            warn!(title = %notification.title, error = %e, "Notification delivery failed");

            let details = json!({ "title": notification.title, "text": notification.text });
            let message = format!("Notification delivery failed: {e:#}");
            if let Err(log_err) = self.audit.log_error(&message, &details).await {
                error!(error = %log_err, "Failed to write error log");
            }
        }
    }
}
