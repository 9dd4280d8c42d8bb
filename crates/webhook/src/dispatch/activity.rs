//! Handlers that only log and notify.

use serde_json::Value;
use tracing::debug;

use super::Dispatcher;
use crate::{
    error::WebhookError,
    event::{
        DeploymentStatusEvent, IssueCommentEvent, SecurityAdvisoryEvent, VulnerabilityAlertEvent,
        DEPLOYMENT_STATUS, ISSUE_COMMENT, SECURITY_ADVISORY, VULNERABILITY_ALERT,
    },
    notify::Notification,
};

impl Dispatcher {
    pub(super) async fn handle_issue_comment(
        &self,
        event: &IssueCommentEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        if event.action != "created" {
            debug!(action = %event.action, "Ignoring issue comment action");
            return Ok(());
        }

        let repository = &event.repository.full_name;
        self.audit.log_event(ISSUE_COMMENT, payload).await?;
        self.notify(Notification::normal(
            format!("New comment on issue #{} in {repository}", event.issue.number),
            format!(
                "💬 New comment on issue #{} in {repository}: \"{}\" by {}",
                event.issue.number, event.comment.body, event.comment.user.login
            ),
        ))
        .await;

        Ok(())
    }

    pub(super) async fn handle_security_advisory(
        &self,
        event: &SecurityAdvisoryEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        if event.action != "published" {
            debug!(action = %event.action, "Ignoring security advisory action");
            return Ok(());
        }

        let repository = &event.repository.full_name;
        let advisory = &event.security_advisory;
        self.audit.log_event(SECURITY_ADVISORY, payload).await?;
        self.notify(Notification::high(
            format!("Security advisory for {repository}"),
            format!("🚨 Security advisory published in {repository}: {}", advisory.summary),
        ))
        .await;

        Ok(())
    }

    pub(super) async fn handle_vulnerability_alert(
        &self,
        event: &VulnerabilityAlertEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        if event.action != "created" {
            debug!(action = %event.action, "Ignoring vulnerability alert action");
            return Ok(());
        }

        let repository = &event.repository.full_name;
        let package = &event.alert.package_name;
        self.audit.log_event(VULNERABILITY_ALERT, payload).await?;
        self.notify(Notification::high(
            format!("Vulnerable dependency {package} in {repository}"),
            format!("🔒 New vulnerability alert in {repository} for {package}"),
        ))
        .await;

        Ok(())
    }

    pub(super) async fn handle_deployment_status(
        &self,
        event: &DeploymentStatusEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        let repository = &event.repository.full_name;
        let status = &event.deployment_status;
        self.audit.log_event(DEPLOYMENT_STATUS, payload).await?;
        self.notify(Notification::normal(
            format!("Deployment {} in {repository}", status.state),
            format!(
                "🚀 Deployment to {} in {repository}: {}",
                status.environment, status.state
            ),
        ))
        .await;

        Ok(())
    }
}
