use eyre::{bail, Result};

use super::WebhookConfig;

const MIN_WEB_LOG_CAPACITY: usize = 100;
const MAX_WEB_LOG_CAPACITY: usize = 1000;
const MAX_RENAME_ATTEMPTS: u32 = 10;
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Validate a loaded config before the server starts
pub fn validate_config(config: &WebhookConfig) -> Result<()> {
    if !(MIN_WEB_LOG_CAPACITY..=MAX_WEB_LOG_CAPACITY).contains(&config.web_log_capacity) {
        bail!(
            "Web log capacity must be between {} and {}, got {}",
            MIN_WEB_LOG_CAPACITY,
            MAX_WEB_LOG_CAPACITY,
            config.web_log_capacity
        );
    }

    let rename = &config.rename;
    if rename.max_attempts == 0 || rename.max_attempts > MAX_RENAME_ATTEMPTS {
        bail!("Rename max attempts must be between 1 and {}", MAX_RENAME_ATTEMPTS);
    }
    if rename.retry_delay_ms > MAX_RETRY_DELAY_MS ||
        rename.conflict_retry_delay_ms > MAX_RETRY_DELAY_MS
    {
        bail!("Rename retry delays must be <= {}ms", MAX_RETRY_DELAY_MS);
    }
    if rename.min_segments == 0 {
        bail!("Rename policy needs at least one segment");
    }
    if rename.allowed_technologies.is_empty() {
        bail!("Rename policy needs at least one allowed technology");
    }
    if rename.quarantine_prefix.trim().is_empty() {
        bail!("Rename quarantine prefix must not be empty");
    }
    if rename.in_progress_marker.is_empty() {
        bail!("Rename in-progress marker must not be empty");
    }

    validate_url("github_api_url", Some(&config.github_api_url))?;
    validate_url("slack_webhook_url", config.notifications.slack_webhook_url.as_ref())?;
    validate_url("discord_webhook_url", config.notifications.discord_webhook_url.as_ref())?;
    validate_url(
        "google_chat_webhook_url",
        config.notifications.google_chat_webhook_url.as_ref(),
    )?;
    validate_url("jira_url", config.ticketing.jira_url.as_ref())?;

    Ok(())
}

fn validate_url(name: &str, value: Option<&String>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };

    let parsed = match url::Url::parse(value) {
        Ok(parsed) => parsed,
        Err(e) => bail!("Invalid {}: '{}': {}", name, value, e),
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid {}: '{}' must use http or https", name, value);
    }

    Ok(())
}
