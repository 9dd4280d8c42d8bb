use async_trait::async_trait;
use eyre::WrapErr;
use reqwest::Client;
use serde_json::json;

use super::{Notification, Notifier, Priority};

const TRELLO_API_URL: &str = "https://api.trello.com";

/// Opens a Jira task for high-priority notifications
pub struct JiraTicketer {
    client: Client,
    base_url: String,
    user: String,
    api_key: String,
    project_key: String,
}

impl JiraTicketer {
    pub fn new(
        client: Client,
        base_url: String,
        user: String,
        api_key: String,
        project_key: String,
    ) -> Self {
        Self { client, base_url, user, api_key, project_key }
    }
}

#[async_trait]
impl Notifier for JiraTicketer {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        if notification.priority != Priority::High {
            return Ok(());
        }

        // API v3 takes descriptions in Atlassian Document Format
        let body = json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": notification.title,
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [{
                        "type": "paragraph",
                        "content": [{ "type": "text", "text": notification.text }]
                    }]
                },
                "issuetype": { "name": "Task" }
            }
        });

        let url = format!("{}/rest/api/3/issue", self.base_url.trim_end_matches('/'));
        self.client
            .post(url)
            .basic_auth(&self.user, Some(&self.api_key))
            .json(&body)
            .send()
            .await
            .wrap_err("Jira request failed")?
            .error_for_status()
            .wrap_err("Jira rejected the ticket")?;
        Ok(())
    }
}

/// Adds a Trello card for high-priority notifications
pub struct TrelloTicketer {
    client: Client,
    api_url: String,
    api_key: String,
    token: String,
    list_id: String,
}

impl TrelloTicketer {
    pub fn new(client: Client, api_key: String, token: String, list_id: String) -> Self {
        Self { client, api_url: TRELLO_API_URL.to_string(), api_key, token, list_id }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl Notifier for TrelloTicketer {
    fn name(&self) -> &'static str {
        "trello"
    }

    async fn send(&self, notification: &Notification) -> eyre::Result<()> {
        if notification.priority != Priority::High {
            return Ok(());
        }

        let url = format!("{}/1/cards", self.api_url.trim_end_matches('/'));
        self.client
            .post(url)
            .query(&[("key", &self.api_key), ("token", &self.token)])
            .json(&json!({
                "name": notification.title,
                "desc": notification.text,
                "idList": self.list_id,
            }))
            .send()
            .await
            .wrap_err("Trello request failed")?
            .error_for_status()
            .wrap_err("Trello rejected the card")?;
        Ok(())
    }
}
