use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::state::AppState;
use commentary_core::service::CommentService;
use commentary_infra::db::{DbPool, PgCommentStore};
use commentary_infra::events::EventBus;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub fn build_state(config: AppConfig, pool: DbPool) -> Result<AppState, WiringError> {
    let client = Client::builder().timeout(config.request_timeout).build()?;
    let events = EventBus::with_capacity(config.event_capacity);
    let settings = config.plugin_settings();
    info!(
        default_status = %settings.default_status,
        visible = ?settings.visible_statuses,
        event_capacity = config.event_capacity,
        "comment service configured"
    );
    let comments = CommentService::new(
        Arc::new(PgCommentStore::new(pool)),
        Arc::new(events.clone()),
        settings,
    );
    Ok(AppState {
        config: Arc::new(config),
        comments,
        events,
        http_client: client,
    })
}
