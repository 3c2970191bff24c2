use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::comments::Comment;
use crate::domain::reports::CommentReport;
use crate::domain::settings::PluginSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventName {
    #[serde(rename = "comment.create")]
    CommentCreate,
    #[serde(rename = "comment.update")]
    CommentUpdate,
    #[serde(rename = "comment.delete")]
    CommentDelete,
    #[serde(rename = "comment.report.create")]
    CommentReportCreate,
    #[serde(rename = "comment.republish")]
    CommentRepublish,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::CommentCreate => "comment.create",
            EventName::CommentUpdate => "comment.update",
            EventName::CommentDelete => "comment.delete",
            EventName::CommentReportCreate => "comment.report.create",
            EventName::CommentRepublish => "comment.republish",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Comment(Comment),
    Report(CommentReport),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub name: EventName,
    pub payload: EventPayload,
    pub settings: PluginSettings,
    pub emitted_at: DateTime<Utc>,
}

impl CommentEvent {
    pub fn comment(name: EventName, comment: Comment, settings: &PluginSettings) -> Self {
        CommentEvent {
            name,
            payload: EventPayload::Comment(comment),
            settings: settings.clone(),
            emitted_at: Utc::now(),
        }
    }

    pub fn report(report: CommentReport, settings: &PluginSettings) -> Self {
        CommentEvent {
            name: EventName::CommentReportCreate,
            payload: EventPayload::Report(report),
            settings: settings.clone(),
            emitted_at: Utc::now(),
        }
    }
}

/// Sink for domain events. `publish` returns once the event is queued for
/// every current subscriber; it never reports delivery failures.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: CommentEvent);
}
