use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use commentary_core::service::CommentService;
use commentary_infra::events::EventBus;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub comments: CommentService,
    pub events: EventBus,
    pub http_client: Client,
}
