use serde_json::Value;
use tracing::{info, warn};

use super::Dispatcher;
use crate::{
    error::WebhookError,
    event::{RepositoryRenameEvent, REPOSITORY_RENAME},
    notify::Notification,
};

impl Dispatcher {
    /// Accept a policy-conforming rename, quarantine anything else.
    ///
    /// Renames into a quarantine name are the echo of an earlier correction
    /// and are only reported.
    pub(super) async fn handle_rename(
        &self,
        event: &RepositoryRenameEvent,
        payload: &Value,
    ) -> Result<(), WebhookError> {
        let decision = self.renamer.evaluate(event);
        self.audit.log_event(REPOSITORY_RENAME, payload).await?;

        if decision.is_valid {
            info!(
                old_name = %decision.old_name,
                new_name = %decision.new_name,
                "Repository renamed"
            );
            self.notify(Notification::normal(
                format!("Repository renamed to {}", decision.new_name),
                format!(
                    "✅ Repository renamed from {} to {} ({})",
                    decision.old_name, decision.new_name, decision.repo_full_name
                ),
            ))
            .await;
            return Ok(());
        }

        if self.renamer.is_quarantined(&decision.new_name) {
            info!(
                repository = %decision.repo_full_name,
                old_name = %decision.old_name,
                "Repository is quarantined"
            );
            self.notify(Notification::normal(
                format!("Repository {} quarantined", decision.old_name),
                format!(
                    "ℹ️ Repository {} was quarantined as {} after its name {} violated the \
                     naming policy.",
                    decision.repo_full_name, decision.new_name, decision.old_name
                ),
            ))
            .await;
            return Ok(());
        }

        let corrective = self.renamer.corrective_name();
        warn!(
            repository = %decision.repo_full_name,
            new_name = %decision.new_name,
            corrective = %corrective,
            "Repository name violates naming policy"
        );

        match self.renamer.rename(&decision.owner, &decision.new_name, &corrective).await {
            Ok(()) => {
                self.notify(Notification::normal(
                    format!("Invalid repository name {} corrected", decision.new_name),
                    format!(
                        "⚠️ Repository {} was renamed from {} to {}, which violates the naming \
                         policy. It has been renamed to {corrective}.",
                        decision.repo_full_name, decision.old_name, decision.new_name
                    ),
                ))
                .await;
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::high(
                    format!("Failed to correct repository name {}", decision.new_name),
                    format!(
                        "❌ Repository {} violates the naming policy and could not be renamed \
                         to {corrective}: {e}",
                        decision.repo_full_name
                    ),
                ))
                .await;
                Err(e.into())
            }
        }
    }
}
