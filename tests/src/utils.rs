use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Once},
};

use hw_common::config::WebhookConfig;
use hw_webhook::{serve, signature::sign, AppState};
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::info;

pub const TEST_SECRET: &str = "integration-test-secret";

static TRACING: Once = Once::new();

/// Install a test subscriber once per process, honouring `RUST_LOG`
pub fn setup_test_env() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config with every file under `dir`, the secret set, and fast rename retries
pub fn test_config(dir: &TempDir, github_api_url: &str) -> WebhookConfig {
    let mut config = WebhookConfig {
        port: 0,
        webhook_secret: Some(TEST_SECRET.to_string()),
        log_dir: dir.path().join("logs"),
        web_log_path: dir.path().join("public/logs.json"),
        web_log_capacity: 100,
        github_token: Some("ghp_integration".to_string()),
        github_api_url: github_api_url.to_string(),
        ..WebhookConfig::default()
    };
    config.rename.retry_delay_ms = 10;
    config.rename.conflict_retry_delay_ms = 20;
    config
}

/// A webhook server bound to a random loopback port
pub struct TestServer {
    pub addr: SocketAddr,
    pub log_dir: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<eyre::Result<()>>,
}

impl TestServer {
    pub async fn start(config: WebhookConfig) -> eyre::Result<Self> {
        setup_test_env();

        let log_dir = config.log_dir.clone();
        let state = AppState::from_config(Arc::new(config)).await?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));
        info!(%addr, "Test server started");

        Ok(Self { addr, log_dir, shutdown: Some(tx), handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Lines of `<log_dir>/<event>.log`, empty if the file does not exist
    pub fn log_lines(&self, event: &str) -> Vec<serde_json::Value> {
        match std::fs::read_to_string(self.log_dir.join(format!("{event}.log"))) {
            Ok(raw) => raw.lines().filter_map(|l| serde_json::from_str(l).ok()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn stop(mut self) -> eyre::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await?
    }
}

/// `x-hub-signature-256` value for `body` under [`TEST_SECRET`]
pub fn signature_for(body: &[u8]) -> String {
    sign(TEST_SECRET.as_bytes(), body).expect("HMAC accepts any key length")
}

/// POST a delivery to `/webhook`, signed unless `signature` is given
pub async fn post_event(
    server: &TestServer,
    event: &str,
    body: &[u8],
    signature: Option<&str>,
) -> reqwest::Response {
    let signature = signature.map(str::to_string).unwrap_or_else(|| signature_for(body));
    reqwest::Client::new()
        .post(server.url("/webhook"))
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .header("x-hub-signature-256", signature)
        .body(body.to_vec())
        .send()
        .await
        .expect("request to test server")
}
