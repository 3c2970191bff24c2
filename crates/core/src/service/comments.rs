//! Comment domain service: ownership checks, listings with reply threads,
//! reports, moderation and republishing, with an event per mutation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::comments::{Comment, CommentPatch, CommentStatus, CommentThread, NewComment};
use crate::domain::events::{CommentEvent, EventName, EventPublisher};
use crate::domain::reports::{CommentReport, NewReport, ReportPatch, ReportStatus};
use crate::domain::settings::PluginSettings;
use crate::error::CoreError;
use crate::store::{CommentFilter, CommentStore, ReportFilter, StoreError};
use crate::types::external_id::MAX_EXTERNAL_ID_LEN;
use crate::types::{DateRange, ExternalId, Page, PageRequest, SortOrder};

const REPUBLISH_BATCH: u32 = 100;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment not found")]
    CommentNotFound(Uuid),
    #[error("Report not found")]
    ReportNotFound(Uuid),
    #[error("You are not authorized to {0} this comment")]
    NotAuthor(&'static str),
    #[error("{0}")]
    Invalid(#[from] CoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommentError {
    pub fn code(&self) -> &'static str {
        match self {
            CommentError::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            CommentError::ReportNotFound(_) => "REPORT_NOT_FOUND",
            CommentError::NotAuthor(_) => "COMMENT_NOT_AUTHOR",
            CommentError::Invalid(_) => "INVALID_INPUT",
            CommentError::Store(StoreError::Conflict(_)) => "VERSION_CONFLICT",
            CommentError::Store(StoreError::Backend(_)) => "STORAGE_ERROR",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdminCommentFilter {
    pub entity_context_id: Option<String>,
    pub status: Option<CommentStatus>,
}

/// Selection for a republish sweep: a creation window, a context, or both.
#[derive(Debug, Clone)]
pub struct RepublishFilter {
    range: Option<DateRange>,
    entity_context_id: Option<String>,
}

impl RepublishFilter {
    pub fn new(range: Option<DateRange>, entity_context_id: Option<String>) -> Result<Self, CoreError> {
        let entity_context_id = entity_context_id.filter(|value| !value.trim().is_empty());
        if range.is_none() && entity_context_id.is_none() {
            return Err(CoreError::Missing("startDate and endDate, or entityContextId"));
        }
        Ok(RepublishFilter {
            range,
            entity_context_id,
        })
    }

    fn to_comment_filter(&self) -> CommentFilter {
        CommentFilter {
            entity_context_id: self.entity_context_id.clone(),
            created_within: self.range,
            ..CommentFilter::default()
        }
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    events: Arc<dyn EventPublisher>,
    settings: PluginSettings,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        events: Arc<dyn EventPublisher>,
        settings: PluginSettings,
    ) -> Self {
        CommentService {
            store,
            events,
            settings,
        }
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub async fn add_comment(&self, author_id: &str, input: NewComment) -> Result<Comment, CommentError> {
        let author_id = ExternalId::parse("authorId", author_id)?;
        let entity_context_id = ExternalId::parse("entityContextId", &input.entity_context_id)?;
        if input.content.trim().is_empty() {
            return Err(CoreError::Missing("content").into());
        }
        let organization_id =
            ExternalId::parse_optional("organizationId", input.organization_id.as_deref())?;
        let section_id = ExternalId::parse_optional("sectionId", input.section_id.as_deref())?;
        if let Some(parent_id) = input.parent_comment_id {
            self.find_comment_or_not_found(parent_id).await?;
        }

        let now = now();
        let comment = Comment {
            id: Uuid::now_v7(),
            content: input.content,
            author_id: author_id.into_string(),
            organization_id: organization_id.map(ExternalId::into_string),
            entity_context_id: entity_context_id.into_string(),
            status: self.settings.default_status,
            parent_comment_id: input.parent_comment_id,
            section_id: section_id.map(ExternalId::into_string),
            is_reported: false,
            version: 1,
            meta: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(&comment).await?;
        info!(
            comment_id = %comment.id,
            entity_context_id = %comment.entity_context_id,
            parent_comment_id = ?comment.parent_comment_id,
            "comment created"
        );
        self.emit(EventName::CommentCreate, &comment).await;
        Ok(comment)
    }

    pub async fn update_own_comment(
        &self,
        comment_id: Uuid,
        content: String,
        user_id: &str,
    ) -> Result<Comment, CommentError> {
        if content.trim().is_empty() {
            return Err(CoreError::Missing("content").into());
        }
        let mut comment = self.find_comment_or_not_found(comment_id).await?;
        ensure_author(&comment, user_id, "update")?;
        comment.content = content;
        comment.updated_at = now();
        let comment = self.store.update_comment(&comment).await?;
        info!(comment_id = %comment.id, version = comment.version, "comment updated by author");
        self.emit(EventName::CommentUpdate, &comment).await;
        Ok(comment)
    }

    pub async fn delete_own_comment(&self, comment_id: Uuid, user_id: &str) -> Result<(), CommentError> {
        let comment = self.find_comment_or_not_found(comment_id).await?;
        ensure_author(&comment, user_id, "delete")?;
        self.remove(comment).await
    }

    /// Public thread listing: visible root comments with their visible
    /// replies.
    pub async fn find_comments_by_entity_context(
        &self,
        entity_context_id: &str,
        page: &PageRequest,
    ) -> Result<Page<CommentThread>, CommentError> {
        let entity_context_id = ExternalId::parse("entityContextId", entity_context_id)?;
        let filter = CommentFilter {
            entity_context_id: Some(entity_context_id.into_string()),
            statuses: Some(self.settings.visible_statuses.clone()),
            roots_only: true,
            ..CommentFilter::default()
        };
        let roots = self.store.list_comments(&filter, page).await?;
        debug!(
            entity_context_id = ?filter.entity_context_id,
            returned = roots.items.len(),
            total = roots.total_count,
            "listed comments for context"
        );
        self.attach_replies(roots, Some(self.settings.visible_statuses.as_slice()))
            .await
    }

    pub async fn find_my_comments(
        &self,
        user_id: &str,
        page: &PageRequest,
    ) -> Result<Page<Comment>, CommentError> {
        let author_id = ExternalId::parse("authorId", user_id)?;
        let filter = CommentFilter {
            author_id: Some(author_id.into_string()),
            ..CommentFilter::default()
        };
        Ok(self.store.list_comments(&filter, page).await?)
    }

    pub async fn report_comment(
        &self,
        comment_id: Uuid,
        author_id: &str,
        input: NewReport,
    ) -> Result<CommentReport, CommentError> {
        let author_id = ExternalId::parse("authorId", author_id)?;
        let reason = short_text("reason", &input.reason)?;
        let category = optional_short_text("category", input.category.as_deref())?;
        let comment = self.find_comment_or_not_found(comment_id).await?;

        let now = now();
        let report = CommentReport {
            id: Uuid::now_v7(),
            author_id: author_id.into_string(),
            comment_id: comment.id,
            reason,
            status: ReportStatus::New,
            category,
            internal_note: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_report(&report).await?;
        info!(report_id = %report.id, comment_id = %comment.id, "comment reported");
        self.events
            .publish(CommentEvent::report(report.clone(), &self.settings))
            .await;
        Ok(report)
    }

    pub async fn admin_find_comments(
        &self,
        filter: AdminCommentFilter,
        page: &PageRequest,
    ) -> Result<Page<CommentThread>, CommentError> {
        let filter = CommentFilter {
            entity_context_id: filter.entity_context_id,
            statuses: filter.status.map(|status| vec![status]),
            roots_only: true,
            ..CommentFilter::default()
        };
        let roots = self.store.list_comments(&filter, page).await?;
        self.attach_replies(roots, None).await
    }

    pub async fn admin_update_comment(
        &self,
        comment_id: Uuid,
        patch: CommentPatch,
    ) -> Result<Comment, CommentError> {
        if patch.is_empty() {
            return Err(CoreError::Missing("status, content or meta").into());
        }
        let mut comment = self.find_comment_or_not_found(comment_id).await?;
        patch.apply(&mut comment);
        comment.updated_at = now();
        let comment = self.store.update_comment(&comment).await?;
        info!(comment_id = %comment.id, status = %comment.status, "comment updated by admin");
        self.emit(EventName::CommentUpdate, &comment).await;
        Ok(comment)
    }

    pub async fn admin_hard_delete_comment(&self, comment_id: Uuid) -> Result<(), CommentError> {
        let comment = self.find_comment_or_not_found(comment_id).await?;
        self.remove(comment).await
    }

    pub async fn admin_soft_delete_comment(&self, comment_id: Uuid) -> Result<Comment, CommentError> {
        let mut comment = self.find_comment_or_not_found(comment_id).await?;
        comment.status = CommentStatus::Deleted;
        comment.updated_at = now();
        let comment = self.store.update_comment(&comment).await?;
        info!(comment_id = %comment.id, "comment soft deleted");
        self.emit(EventName::CommentUpdate, &comment).await;
        Ok(comment)
    }

    /// Re-emits `comment.republish` for every matching comment, oldest first.
    pub async fn admin_republish_comments(&self, filter: RepublishFilter) -> Result<usize, CommentError> {
        let filter = filter.to_comment_filter();
        let mut request = PageRequest::first(REPUBLISH_BATCH, SortOrder::Asc);
        let mut count = 0;
        loop {
            let page = self.store.list_comments(&filter, &request).await?;
            let next = page.items.last().map(Comment::cursor);
            for comment in &page.items {
                self.emit(EventName::CommentRepublish, comment).await;
                count += 1;
            }
            match next {
                Some(cursor) if page.has_next_page => request = request.after(cursor),
                _ => break,
            }
        }
        info!(
            count,
            entity_context_id = ?filter.entity_context_id,
            "comments republished"
        );
        Ok(count)
    }

    pub async fn admin_find_reports(
        &self,
        filter: ReportFilter,
        page: &PageRequest,
    ) -> Result<Page<CommentReport>, CommentError> {
        Ok(self.store.list_reports(&filter, page).await?)
    }

    pub async fn admin_update_report(
        &self,
        report_id: Uuid,
        patch: ReportPatch,
    ) -> Result<CommentReport, CommentError> {
        let patch = ReportPatch {
            status: patch.status,
            category: optional_short_text("category", patch.category.as_deref())?,
            internal_note: optional_short_text("internalNote", patch.internal_note.as_deref())?,
        };
        if patch.is_empty() {
            return Err(CoreError::Missing("status, category or internalNote").into());
        }
        let mut report = self
            .store
            .find_report(report_id)
            .await?
            .ok_or(CommentError::ReportNotFound(report_id))?;
        patch.apply(&mut report);
        report.updated_at = now();
        let report = self.store.update_report(&report).await?;
        info!(report_id = %report.id, status = %report.status, "report updated by admin");
        Ok(report)
    }

    async fn find_comment_or_not_found(&self, comment_id: Uuid) -> Result<Comment, CommentError> {
        self.store
            .find_comment(comment_id)
            .await?
            .ok_or(CommentError::CommentNotFound(comment_id))
    }

    async fn remove(&self, comment: Comment) -> Result<(), CommentError> {
        if !self.store.delete_comment(comment.id).await? {
            return Err(CommentError::CommentNotFound(comment.id));
        }
        info!(comment_id = %comment.id, "comment deleted");
        self.emit(EventName::CommentDelete, &comment).await;
        Ok(())
    }

    async fn attach_replies(
        &self,
        roots: Page<Comment>,
        statuses: Option<&[CommentStatus]>,
    ) -> Result<Page<CommentThread>, CommentError> {
        let parent_ids: Vec<Uuid> = roots.items.iter().map(|comment| comment.id).collect();
        let replies = if parent_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_replies(&parent_ids, statuses).await?
        };
        let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for reply in replies {
            if let Some(parent_id) = reply.parent_comment_id {
                by_parent.entry(parent_id).or_default().push(reply);
            }
        }
        Ok(roots.map(|comment| CommentThread {
            sub_comments: by_parent.remove(&comment.id).unwrap_or_default(),
            comment,
        }))
    }

    async fn emit(&self, name: EventName, comment: &Comment) {
        debug!(event = name.as_str(), comment_id = %comment.id, "publishing event");
        self.events
            .publish(CommentEvent::comment(name, comment.clone(), &self.settings))
            .await;
    }
}

fn ensure_author(comment: &Comment, user_id: &str, action: &'static str) -> Result<(), CommentError> {
    if comment.author_id != user_id.trim() {
        return Err(CommentError::NotAuthor(action));
    }
    Ok(())
}

fn short_text(field: &'static str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Missing(field));
    }
    if trimmed.chars().count() > MAX_EXTERNAL_ID_LEN {
        return Err(CoreError::TooLong(field));
    }
    Ok(trimmed.to_string())
}

/// Blank means absent; anything else must pass `short_text`.
fn optional_short_text(field: &'static str, value: Option<&str>) -> Result<Option<String>, CoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => short_text(field, value).map(Some),
    }
}

/// Postgres keeps microseconds; truncating up front keeps cursors exact.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
