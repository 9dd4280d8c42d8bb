use async_trait::async_trait;
use eyre::WrapErr;
use reqwest::Client;
use serde_json::json;

use super::{Notification, Notifier};

pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(client: Client, webhook_url: String, channel: String) -> Self {
        Self { client, webhook_url, channel }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        let body = json!({
            "channel": self.channel,
            "text": notification.text,
            "username": "GitHub Webhook",
            "icon_emoji": ":github:",
        });
        post_json(&self.client, &self.webhook_url, &body).await
    }
}

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, webhook_url: String) -> Self {
        Self { client, webhook_url }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        post_json(&self.client, &self.webhook_url, &json!({ "content": notification.text })).await
    }
}

pub struct GoogleChatNotifier {
    client: Client,
    webhook_url: String,
}

impl GoogleChatNotifier {
    pub fn new(client: Client, webhook_url: String) -> Self {
        Self { client, webhook_url }
    }
}

#[async_trait]
impl Notifier for GoogleChatNotifier {
    fn name(&self) -> &'static str {
        "google_chat"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        post_json(&self.client, &self.webhook_url, &json!({ "text": notification.text })).await
    }
}

async fn post_json(client: &Client, url: &str, body: &serde_json::Value) -> eyre::Result<()> {
    client
        .post(url)
        .json(body)
        .send()
        .await
        .wrap_err("request failed")?
        .error_for_status()
        .wrap_err("webhook rejected the message")?;
    Ok(())
}
