use serde::Serialize;

use crate::domain::comments::CommentStatus;

/// Service-wide knobs. Travels with every published event so consumers see
/// the configuration that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    pub default_status: CommentStatus,
    pub visible_statuses: Vec<CommentStatus>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        PluginSettings {
            default_status: CommentStatus::Published,
            visible_statuses: vec![CommentStatus::Published],
        }
    }
}
