use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    New,
    InReview,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::New => "new",
            ReportStatus::InReview => "in_review",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "new" => Ok(ReportStatus::New),
            "in_review" => Ok(ReportStatus::InReview),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user complaint about a comment. Refers to its comment by id only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReport {
    pub id: Uuid,
    pub author_id: String,
    pub comment_id: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    pub category: Option<String>,
    pub internal_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentReport {
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.created_at, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reason: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportPatch {
    pub status: Option<ReportStatus>,
    pub category: Option<String>,
    pub internal_note: Option<String>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.category.as_deref().is_none_or(str::is_empty)
            && self.internal_note.as_deref().is_none_or(str::is_empty)
    }

    pub fn apply(self, report: &mut CommentReport) {
        if let Some(status) = self.status {
            report.status = status;
        }
        if let Some(category) = self.category.filter(|value| !value.is_empty()) {
            report.category = Some(category);
        }
        if let Some(note) = self.internal_note.filter(|value| !value.is_empty()) {
            report.internal_note = Some(note);
        }
    }
}
