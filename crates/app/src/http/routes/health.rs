use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use commentary_core::domain::settings::PluginSettings;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
    pub settings: PluginSettings,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub auth: ModuleStatus,
    pub events: EventsStatus,
    pub webhook: ModuleStatus,
}

#[derive(Debug, Serialize)]
pub struct ModuleStatus {
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct EventsStatus {
    pub subscribers: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let auth_configured = state
        .config
        .token_secret
        .as_ref()
        .is_some_and(|value| !value.is_empty());
    let webhook_configured = state.config.event_webhook_url.is_some();

    Json(HealthResponse {
        status: "ok",
        modules: HealthModules {
            auth: ModuleStatus {
                configured: auth_configured,
            },
            events: EventsStatus {
                subscribers: state.events.subscriber_count(),
            },
            webhook: ModuleStatus {
                configured: webhook_configured,
            },
        },
        settings: state.comments.settings().clone(),
    })
}
