use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use hw_common::{
    config::{load_config, CONFIG_PATH_ENV},
    logging::init_tracing,
};
use hw_webhook::start_webhook_server;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "hookwarden", version)]
#[command(about = "Verifies GitHub webhook deliveries and acts on them", long_about = None)]
struct Cli {
    /// TOML config file, environment variables override its values
    #[arg(long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Listen port, overrides PORT and the config file
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;

    let _guard = init_tracing(&config.logging)?;

    let notifications = &config.notifications;
    let ticketing = &config.ticketing;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        log_dir = %config.log_dir.display(),
        web_log = %config.web_log_path.display(),
        github_token = config.github_token.is_some(),
        slack = notifications.slack_webhook_url.is_some(),
        discord = notifications.discord_webhook_url.is_some(),
        google_chat = notifications.google_chat_webhook_url.is_some(),
        jira = ticketing.jira_url.is_some() && ticketing.jira_api_key.is_some(),
        trello = ticketing.trello_api_key.is_some(),
        "Starting hookwarden"
    );

    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET is not set, every delivery will be rejected");
    }
    let missing = config.missing_required();
    if !missing.is_empty() {
        warn!(?missing, "Some required configuration values are missing");
    }

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal, stopping gracefully..."),
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    start_webhook_server(config, shutdown).await?;

    info!("hookwarden shutdown complete");
    Ok(())
}
