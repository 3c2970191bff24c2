use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::comments::{Comment, CommentStatus};
use crate::domain::reports::{CommentReport, ReportStatus};
use crate::types::{DateRange, Page, PageRequest};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comment {0} was modified concurrently")]
    Conflict(Uuid),
    #[error("storage error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Row selection for comment listings. Empty fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub entity_context_id: Option<String>,
    pub author_id: Option<String>,
    pub statuses: Option<Vec<CommentStatus>>,
    pub roots_only: bool,
    pub created_within: Option<DateRange>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        if self.roots_only && !comment.is_root() {
            return false;
        }
        if let Some(context) = self.entity_context_id.as_deref() {
            if comment.entity_context_id != context {
                return false;
            }
        }
        if let Some(author) = self.author_id.as_deref() {
            if comment.author_id != author {
                return false;
            }
        }
        if let Some(statuses) = self.statuses.as_ref() {
            if !statuses.contains(&comment.status) {
                return false;
            }
        }
        if let Some(range) = self.created_within.as_ref() {
            if !range.contains(comment.created_at) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub comment_id: Option<Uuid>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    pub fn matches(&self, report: &CommentReport) -> bool {
        self.comment_id.is_none_or(|id| report.comment_id == id)
            && self.status.is_none_or(|status| report.status == status)
    }
}

/// Persistence seam for comments and their reports.
///
/// Listings walk `(created_at, id)` in the request's sort order and return at
/// most `page.first` items.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

    /// Writes every mutable column of `comment` provided the stored version
    /// still equals `comment.version`. Returns the row as stored, with the
    /// version bumped.
    async fn update_comment(&self, comment: &Comment) -> Result<Comment, StoreError>;

    /// Returns false when no row was removed.
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: &PageRequest,
    ) -> Result<Page<Comment>, StoreError>;

    /// Direct replies of `parent_ids`, oldest first.
    async fn list_replies(
        &self,
        parent_ids: &[Uuid],
        statuses: Option<&[CommentStatus]>,
    ) -> Result<Vec<Comment>, StoreError>;

    /// Inserts the report and flags its comment as reported in one unit.
    async fn insert_report(&self, report: &CommentReport) -> Result<(), StoreError>;

    async fn find_report(&self, id: Uuid) -> Result<Option<CommentReport>, StoreError>;

    async fn update_report(&self, report: &CommentReport) -> Result<CommentReport, StoreError>;

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: &PageRequest,
    ) -> Result<Page<CommentReport>, StoreError>;
}
