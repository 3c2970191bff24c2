//! In-process doubles for the store and event seams.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::comments::{Comment, CommentStatus};
use crate::domain::events::{CommentEvent, EventName, EventPublisher};
use crate::domain::reports::CommentReport;
use crate::store::{CommentFilter, CommentStore, ReportFilter, StoreError};
use crate::types::{Cursor, Page, PageRequest, SortOrder};

#[derive(Debug, Default)]
struct Tables {
    comments: Vec<Comment>,
    reports: Vec<CommentReport>,
}

/// `CommentStore` over two vectors, with the same keyset semantics as the
/// Postgres store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.lock().comments.clone()
    }

    pub fn reports(&self) -> Vec<CommentReport> {
        self.lock().reports.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn walk<T: Clone, F>(rows: &[T], page: &PageRequest, key: F) -> Page<T>
where
    F: Fn(&T) -> Cursor,
{
    let mut matching: Vec<T> = rows.to_vec();
    matching.sort_by_key(|row| {
        let cursor = key(row);
        (cursor.created_at, cursor.id)
    });
    if page.sort == SortOrder::Desc {
        matching.reverse();
    }
    let total_count = matching.len() as i64;
    let fetched: Vec<T> = matching
        .into_iter()
        .filter(|row| {
            page.after.is_none_or(|after| {
                let cursor = key(row);
                after.admits(cursor.created_at, cursor.id, page.sort)
            })
        })
        .take(page.fetch_limit() as usize)
        .collect();
    Page::from_fetch(fetched, total_count, page, key)
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.lock().comments.push(comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        Ok(self.lock().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        let mut tables = self.lock();
        let stored = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id && c.version == comment.version)
            .ok_or(StoreError::Conflict(comment.id))?;
        *stored = Comment {
            version: comment.version + 1,
            ..comment.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Ok(false);
        }
        tables.reports.retain(|r| r.comment_id != id);
        for child in tables.comments.iter_mut() {
            if child.parent_comment_id == Some(id) {
                child.parent_comment_id = None;
            }
        }
        Ok(true)
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: &PageRequest,
    ) -> Result<Page<Comment>, StoreError> {
        let tables = self.lock();
        let rows: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        Ok(walk(&rows, page, Comment::cursor))
    }

    async fn list_replies(
        &self,
        parent_ids: &[Uuid],
        statuses: Option<&[CommentStatus]>,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.lock();
        let mut replies: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.parent_comment_id.is_some_and(|parent| parent_ids.contains(&parent)))
            .filter(|c| statuses.is_none_or(|allowed| allowed.contains(&c.status)))
            .cloned()
            .collect();
        replies.sort_by_key(|c| (c.created_at, c.id));
        Ok(replies)
    }

    async fn insert_report(&self, report: &CommentReport) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == report.comment_id)
            .ok_or_else(|| StoreError::Backend(format!("comment {} missing", report.comment_id).into()))?;
        comment.is_reported = true;
        comment.version += 1;
        comment.updated_at = report.created_at;
        tables.reports.push(report.clone());
        Ok(())
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<CommentReport>, StoreError> {
        Ok(self.lock().reports.iter().find(|r| r.id == id).cloned())
    }

    async fn update_report(&self, report: &CommentReport) -> Result<CommentReport, StoreError> {
        let mut tables = self.lock();
        let stored = tables
            .reports
            .iter_mut()
            .find(|r| r.id == report.id)
            .ok_or_else(|| StoreError::Backend(format!("report {} missing", report.id).into()))?;
        *stored = report.clone();
        Ok(stored.clone())
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: &PageRequest,
    ) -> Result<Page<CommentReport>, StoreError> {
        let tables = self.lock();
        let rows: Vec<CommentReport> = tables
            .reports
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(walk(&rows, page, CommentReport::cursor))
    }
}

/// Keeps every published event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<CommentEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CommentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<EventName> {
        self.events().into_iter().map(|event| event.name).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: CommentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
