use async_trait::async_trait;
use uuid::Uuid;

use commentary_core::domain::comments::{Comment, CommentStatus};
use commentary_core::domain::reports::CommentReport;
use commentary_core::store::{CommentFilter, CommentStore, ReportFilter, StoreError};
use commentary_core::types::{Page, PageRequest};

use super::comments_repo::{self, CommentsRepoError};
use super::reports_repo::{self, ReportsRepoError};
use super::DbPool;

/// `CommentStore` backed by the `comment` and `comment_report` tables.
#[derive(Debug, Clone)]
pub struct PgCommentStore {
    pool: DbPool,
}

impl PgCommentStore {
    pub fn new(pool: DbPool) -> Self {
        PgCommentStore { pool }
    }
}

impl From<CommentsRepoError> for StoreError {
    fn from(err: CommentsRepoError) -> Self {
        match err {
            CommentsRepoError::Conflict(id) => StoreError::Conflict(id),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

impl From<ReportsRepoError> for StoreError {
    fn from(err: ReportsRepoError) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        Ok(comments_repo::insert_comment(&self.pool, comment).await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        Ok(comments_repo::find_comment(&self.pool, id).await?)
    }

    async fn update_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        Ok(comments_repo::update_comment(&self.pool, comment).await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(comments_repo::delete_comment(&self.pool, id).await?)
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: &PageRequest,
    ) -> Result<Page<Comment>, StoreError> {
        Ok(comments_repo::list_comments(&self.pool, filter, page).await?)
    }

    async fn list_replies(
        &self,
        parent_ids: &[Uuid],
        statuses: Option<&[CommentStatus]>,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(comments_repo::list_replies(&self.pool, parent_ids, statuses).await?)
    }

    async fn insert_report(&self, report: &CommentReport) -> Result<(), StoreError> {
        Ok(reports_repo::insert_report(&self.pool, report).await?)
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<CommentReport>, StoreError> {
        Ok(reports_repo::find_report(&self.pool, id).await?)
    }

    async fn update_report(&self, report: &CommentReport) -> Result<CommentReport, StoreError> {
        Ok(reports_repo::update_report(&self.pool, report).await?)
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: &PageRequest,
    ) -> Result<Page<CommentReport>, StoreError> {
        Ok(reports_repo::list_reports(&self.pool, filter, page).await?)
    }
}
