use std::sync::Arc;

use eyre::{Result, WrapErr};
use hw_common::config::WebhookConfig;
use tracing::info;

use crate::{
    audit::AuditLogger,
    dispatch::Dispatcher,
    github::GitHubClient,
    infrastructure::HttpClientFactory,
    notify::NotificationHub,
    renamer::RepositoryRenamer,
    signature::SignatureVerifier,
};

/// Application state shared across webhook handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebhookConfig>,
    pub verifier: SignatureVerifier,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Arc<WebhookConfig>, dispatcher: Arc<Dispatcher>) -> Self {
        let verifier = SignatureVerifier::new(config.webhook_secret.as_deref());
        Self { config, verifier, dispatcher }
    }

    /// Wire the production collaborators described by `config`
    pub async fn from_config(config: Arc<WebhookConfig>) -> Result<Self> {
        let client = HttpClientFactory::new().create_client()?;

        let audit = AuditLogger::open(
            &config.log_dir,
            &config.web_log_path,
            config.web_log_capacity,
        )
        .await
        .wrap_err("Failed to open audit log")?;

        let github = Arc::new(GitHubClient::new(
            client.clone(),
            config.github_api_url.clone(),
            config.github_token.clone(),
        ));
        let hub = NotificationHub::from_config(&config, client);
        info!(channels = ?hub.channel_names(), "Notification channels configured");

        let renamer = Arc::new(RepositoryRenamer::new(github.clone(), &config.rename));
        let dispatcher =
            Arc::new(Dispatcher::new(Arc::new(audit), Arc::new(hub), github, renamer));

        Ok(Self::new(config, dispatcher))
    }
}
