//! Best-effort notification fan-out to chat and ticketing backends.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use hw_common::config::WebhookConfig;
use reqwest::Client;
use tracing::{debug, warn};

use crate::metrics::NOTIFICATIONS;

mod chat;
mod ticket;

pub use chat::{DiscordNotifier, GoogleChatNotifier, SlackNotifier};
pub use ticket::{JiraTicketer, TrelloTicketer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    /// Also opens tickets
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub priority: Priority,
    /// Short one-line summary, used as ticket title
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn normal(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { priority: Priority::Normal, title: title.into(), text: text.into() }
    }

    pub fn high(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { priority: Priority::High, title: title.into(), text: text.into() }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> eyre::Result<()>;
}

/// Sends each notification to every configured channel concurrently
pub struct NotificationHub {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotificationHub {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Build the hub from config, channels without credentials are left out
    pub fn from_config(config: &WebhookConfig, client: Client) -> Self {
        let notifications = &config.notifications;
        let ticketing = &config.ticketing;
        let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();

        if let Some(url) = &notifications.slack_webhook_url {
            channels.push(Arc::new(SlackNotifier::new(
                client.clone(),
                url.clone(),
                notifications.slack_channel.clone(),
            )));
        } else {
            warn!("Slack webhook URL is not configured");
        }
        if let Some(url) = &notifications.discord_webhook_url {
            channels.push(Arc::new(DiscordNotifier::new(client.clone(), url.clone())));
        }
        if let Some(url) = &notifications.google_chat_webhook_url {
            channels.push(Arc::new(GoogleChatNotifier::new(client.clone(), url.clone())));
        }

        match (&ticketing.jira_url, &ticketing.jira_api_key) {
            (Some(url), Some(key)) => channels.push(Arc::new(JiraTicketer::new(
                client.clone(),
                url.clone(),
                ticketing.jira_user.clone(),
                key.clone(),
                ticketing.jira_project_key.clone(),
            ))),
            _ => warn!("Jira API key or URL is not configured"),
        }
        if let (Some(key), Some(token), Some(list_id)) =
            (&ticketing.trello_api_key, &ticketing.trello_token, &ticketing.trello_list_id)
        {
            channels.push(Arc::new(TrelloTicketer::new(
                client,
                key.clone(),
                token.clone(),
                list_id.clone(),
            )));
        }

        Self::new(channels)
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Notifier for NotificationHub {
    fn name(&self) -> &'static str {
        "hub"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        let results =
            join_all(self.channels.iter().map(|channel| async move {
                (channel.name(), channel.send(notification).await)
            }))
            .await;

        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(()) => {
                    NOTIFICATIONS.with_label_values(&[name, "sent"]).inc();
                    debug!(channel = name, "Notification sent");
                }
                Err(e) => {
                    NOTIFICATIONS.with_label_values(&[name, "failed"]).inc();
                    failures.push(format!("{name}: {e:#}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(eyre::eyre!("notification delivery failed: {}", failures.join("; ")))
        }
    }
}
