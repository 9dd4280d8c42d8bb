use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Deliveries that passed signature verification, by event tag
    pub static ref EVENTS_RECEIVED: IntCounterVec = register_int_counter_vec!(
        "hw_webhook_events_total",
        "Webhook deliveries accepted for dispatch",
        &["event"]
    )
    .expect("Failed to register events received metric");

    /// Deliveries answered with an error, by reason
    pub static ref EVENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "hw_webhook_rejected_total",
        "Webhook deliveries rejected or failed",
        &["reason"]
    )
    .expect("Failed to register events rejected metric");

    /// Corrective rename calls against the GitHub API
    pub static ref RENAME_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "hw_rename_attempts_total",
        "Repository rename API attempts",
        &["outcome"]
    )
    .expect("Failed to register rename attempts metric");

    pub static ref NOTIFICATIONS: IntCounterVec = register_int_counter_vec!(
        "hw_notifications_total",
        "Notifications per channel and outcome",
        &["channel", "outcome"]
    )
    .expect("Failed to register notifications metric");
}

/// Render the default registry in the Prometheus text format
pub fn render() -> eyre::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
