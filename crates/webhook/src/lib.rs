pub mod audit;
pub mod cicd;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod github;
pub mod infrastructure;
pub mod metrics;
pub mod notify;
pub mod renamer;
pub mod retry;
pub mod signature;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dispatch::Dispatcher;
pub use error::WebhookError;
pub use signature::{SignatureError, SignatureVerifier};
pub use webhook::{create_router, serve, start_webhook_server, AppState};
