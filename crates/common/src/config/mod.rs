use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::debug;

mod validation;

pub use validation::validate_config;

/// Env var pointing at an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "HOOKWARDEN_CONFIG";

/// Config keys reported by `/check-config`, named after the env vars that set them
pub const REQUIRED_CONFIG_KEYS: [&str; 5] =
    ["WEBHOOK_SECRET", "GITHUB_TOKEN", "SLACK_WEBHOOK_URL", "JIRA_API_KEY", "JIRA_URL"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Port the HTTP server listens on
    pub port: u16,

    /// Shared secret used to sign webhook deliveries
    pub webhook_secret: Option<String>,

    /// Directory holding the per-event audit logs and `errors.log`
    pub log_dir: PathBuf,

    /// JSON array file served at `/logs.json`
    pub web_log_path: PathBuf,

    /// Maximum number of entries kept in the rolling web log
    pub web_log_capacity: usize,

    /// Token used for the repository rename and CI dispatch calls
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    pub github_api_url: String,

    pub notifications: NotificationConfig,

    pub ticketing: TicketingConfig,

    pub rename: RenameConfig,

    pub logging: LogConfig,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            webhook_secret: None,
            log_dir: PathBuf::from("./logs"),
            web_log_path: PathBuf::from("./public/logs.json"),
            web_log_capacity: 1000,
            github_token: None,
            github_api_url: "https://api.github.com".to_string(),
            notifications: NotificationConfig::default(),
            ticketing: TicketingConfig::default(),
            rename: RenameConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub slack_webhook_url: Option<String>,
    pub slack_channel: String,
    pub discord_webhook_url: Option<String>,
    pub google_chat_webhook_url: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            slack_channel: "github-alerts".to_string(),
            discord_webhook_url: None,
            google_chat_webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TicketingConfig {
    pub jira_api_key: Option<String>,
    pub jira_url: Option<String>,
    pub jira_user: String,
    pub jira_project_key: String,
    pub trello_api_key: Option<String>,
    pub trello_token: Option<String>,
    pub trello_list_id: Option<String>,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            jira_api_key: None,
            jira_url: None,
            jira_user: "admin".to_string(),
            jira_project_key: "SEC".to_string(),
            trello_api_key: None,
            trello_token: None,
            trello_list_id: None,
        }
    }
}

/// Naming policy and retry settings for repository renames
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Character splitting a repository name into segments
    pub separator: char,

    /// Minimum number of segments a valid name must have
    pub min_segments: usize,

    /// Accepted values for the last segment, compared case-insensitively
    pub allowed_technologies: Vec<String>,

    /// Literal prefix of the corrective name, followed by a timestamp
    pub quarantine_prefix: String,

    /// Total rename attempts while GitHub reports a rename in progress
    pub max_attempts: u32,

    /// Delay between "in progress" retries in milliseconds
    pub retry_delay_ms: u64,

    /// Delay before the single extra attempt after a 422 in milliseconds
    pub conflict_retry_delay_ms: u64,

    /// Substring of the API error message marking a rename still in progress
    pub in_progress_marker: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            separator: '-',
            min_segments: 3,
            allowed_technologies: ["node", "html", "css", "javascript", "python", "ruby", "php"]
                .into_iter()
                .map(String::from)
                .collect(),
            quarantine_prefix: "invalid-name-".to_string(),
            max_attempts: 3,
            retry_delay_ms: 2000,
            conflict_retry_delay_ms: 5000,
            in_progress_marker: "in progress".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub filter: String,

    /// Emit JSON lines instead of the human readable format
    pub json: bool,

    /// Also write daily rolling files into this directory
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false, dir: None }
    }
}

impl WebhookConfig {
    /// Parse a config from TOML text, missing fields take their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).wrap_err("Failed to parse config TOML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    /// Overlay values from the environment, `lookup` returns `None` for unset keys
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.port = port.parse().wrap_err_with(|| format!("Invalid PORT '{port}'"))?;
        }
        if let Some(capacity) = get("WEB_LOG_CAPACITY") {
            self.web_log_capacity = capacity
                .parse()
                .wrap_err_with(|| format!("Invalid WEB_LOG_CAPACITY '{capacity}'"))?;
        }
        if let Some(dir) = get("LOG_PATH") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("WEB_LOG_PATH") {
            self.web_log_path = PathBuf::from(path);
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github_api_url = url;
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.logging.json = format.eq_ignore_ascii_case("json");
        }

        set_if_present(&mut self.webhook_secret, get("WEBHOOK_SECRET"));
        set_if_present(&mut self.github_token, get("GITHUB_TOKEN"));
        set_if_present(&mut self.notifications.slack_webhook_url, get("SLACK_WEBHOOK_URL"));
        set_if_present(&mut self.notifications.discord_webhook_url, get("DISCORD_WEBHOOK_URL"));
        set_if_present(
            &mut self.notifications.google_chat_webhook_url,
            get("GOOGLE_CHAT_WEBHOOK_URL"),
        );
        set_if_present(&mut self.ticketing.jira_api_key, get("JIRA_API_KEY"));
        set_if_present(&mut self.ticketing.jira_url, get("JIRA_URL"));
        set_if_present(&mut self.ticketing.trello_api_key, get("TRELLO_API_KEY"));
        set_if_present(&mut self.ticketing.trello_token, get("TRELLO_TOKEN"));
        set_if_present(&mut self.ticketing.trello_list_id, get("TRELLO_LIST_ID"));

        Ok(())
    }

    /// Required settings that are absent or empty, by env var name
    pub fn missing_required(&self) -> Vec<&'static str> {
        let values = [
            &self.webhook_secret,
            &self.github_token,
            &self.notifications.slack_webhook_url,
            &self.ticketing.jira_api_key,
            &self.ticketing.jira_url,
        ];

        REQUIRED_CONFIG_KEYS
            .into_iter()
            .zip(values)
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(key, _)| key)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        validate_config(self)
    }
}

fn set_if_present(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Load the config: optional TOML file, then `.env`, then process environment
pub fn load_config(path: Option<&Path>) -> Result<WebhookConfig> {
    if let Ok(dotenv_path) = dotenvy::dotenv() {
        debug!(path = %dotenv_path.display(), "Loaded .env file");
    }

    let from_env = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let mut config = match path.map(Path::to_path_buf).or(from_env) {
        Some(path) => WebhookConfig::from_file(&path)?,
        None => WebhookConfig::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
