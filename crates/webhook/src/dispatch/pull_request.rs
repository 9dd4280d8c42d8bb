use serde_json::Value;
use tracing::debug;

use super::Dispatcher;
use crate::{
    error::WebhookError,
    event::{PullRequestEvent, PULL_REQUEST},
    notify::Notification,
};

impl Dispatcher {
    pub(super) async fn handle_pull_request(
        &self,
        event: &PullRequestEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        let pr = &event.pull_request;
        let repository = &event.repository.full_name;

        debug!(
            %repository,
            number = pr.number,
            action = %event.action,
            base = %pr.base.git_ref,
            head = %pr.head.git_ref,
            author = %pr.user.login,
            "Pull request received"
        );
        self.audit.log_event(PULL_REQUEST, payload).await?;

        match event.action.as_str() {
            "opened" | "reopened" => {
                self.notify(Notification::normal(
                    format!("PR #{} opened in {repository}", pr.number),
                    format!("📝 New PR #{}: {} in {repository}", pr.number, pr.title),
                ))
                .await;
            }
            "closed" if pr.merged => {
                self.notify(Notification::normal(
                    format!("PR #{} merged in {repository}", pr.number),
                    format!("✅ PR #{} merged in {repository}", pr.number),
                ))
                .await;
            }
            action => debug!(action, "No notification for pull request action"),
        }

        Ok(())
    }
}
