use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Published,
    Pending,
    Approved,
    Deleted,
}

impl CommentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Published => "published",
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for CommentStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "published" => Ok(CommentStatus::Published),
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            "deleted" => Ok(CommentStatus::Deleted),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored comment. Carries no child collections, so it doubles as the
/// redacted shape published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: String,
    pub organization_id: Option<String>,
    pub entity_context_id: String,
    pub status: CommentStatus,
    pub parent_comment_id: Option<Uuid>,
    pub section_id: Option<String>,
    pub is_reported: bool,
    pub version: i32,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_comment_id.is_none()
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

/// A root comment with its direct replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub sub_comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub entity_context_id: String,
    pub parent_comment_id: Option<Uuid>,
    pub organization_id: Option<String>,
    pub section_id: Option<String>,
}

/// Admin field merge. Only present, non-empty values overwrite.
#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub status: Option<CommentStatus>,
    pub content: Option<String>,
    pub meta: Option<Value>,
}

impl CommentPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.content.as_deref().is_none_or(str::is_empty)
            && self.meta.as_ref().is_none_or(Value::is_null)
    }

    pub fn apply(self, comment: &mut Comment) {
        if let Some(status) = self.status {
            comment.status = status;
        }
        if let Some(content) = self.content.filter(|value| !value.is_empty()) {
            comment.content = content;
        }
        if let Some(meta) = self.meta.filter(|value| !value.is_null()) {
            comment.meta = Some(meta);
        }
    }
}
