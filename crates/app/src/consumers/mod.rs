//! Background subscribers of the comment event bus.

pub mod log_sink;
pub mod webhook;

use tokio::task::JoinHandle;
use tracing::info;

use crate::state::AppState;

/// Subscribes every configured consumer. Must run before the HTTP server
/// starts so no early event is missed.
pub fn spawn_all(state: &AppState) -> Vec<JoinHandle<()>> {
    let mut handles = vec![tokio::spawn(log_sink::run(state.events.subscribe()))];
    if let Some(url) = state.config.event_webhook_url.clone() {
        info!(%url, "event webhook forwarder enabled");
        let forwarder = webhook::WebhookForwarder::new(
            state.http_client.clone(),
            url,
            state.config.event_webhook_secret.clone(),
        );
        handles.push(tokio::spawn(forwarder.run(state.events.subscribe())));
    }
    handles
}
