use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;
use uuid::Uuid;

use commentary_core::domain::comments::{Comment, CommentStatus};
use commentary_core::store::CommentFilter;
use commentary_core::types::{Page, PageRequest};

pub(crate) const COMMENT_COLUMNS: &str = "id, content, author_id, organization_id, \
    entity_context_id, status, parent_comment_id, section_id, is_reported, version, meta, \
    created_at, updated_at";

#[derive(Debug, Error)]
pub enum CommentsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("comment {0} was modified concurrently")]
    Conflict(Uuid),
}

pub async fn insert_comment(pool: &PgPool, comment: &Comment) -> Result<(), CommentsRepoError> {
    sqlx::query(
        r#"
        INSERT INTO comment (
            id,
            content,
            author_id,
            organization_id,
            entity_context_id,
            status,
            parent_comment_id,
            section_id,
            is_reported,
            version,
            meta,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(comment.id)
    .bind(&comment.content)
    .bind(&comment.author_id)
    .bind(comment.organization_id.as_deref())
    .bind(&comment.entity_context_id)
    .bind(comment.status.as_str())
    .bind(comment.parent_comment_id)
    .bind(comment.section_id.as_deref())
    .bind(comment.is_reported)
    .bind(comment.version)
    .bind(comment.meta.as_ref())
    .bind(comment.created_at)
    .bind(comment.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_comment(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, CommentsRepoError> {
    let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_comment).transpose()?)
}

/// Optimistic write: only lands when the stored version matches.
pub async fn update_comment(pool: &PgPool, comment: &Comment) -> Result<Comment, CommentsRepoError> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE comment
        SET content = $3,
            status = $4,
            organization_id = $5,
            section_id = $6,
            is_reported = $7,
            meta = $8,
            updated_at = $9,
            version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(comment.id)
    .bind(comment.version)
    .bind(&comment.content)
    .bind(comment.status.as_str())
    .bind(comment.organization_id.as_deref())
    .bind(comment.section_id.as_deref())
    .bind(comment.is_reported)
    .bind(comment.meta.as_ref())
    .bind(comment.updated_at)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => Ok(map_comment(&row)?),
        None => Err(CommentsRepoError::Conflict(comment.id)),
    }
}

pub async fn delete_comment(pool: &PgPool, id: Uuid) -> Result<bool, CommentsRepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM comment
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_comments(
    pool: &PgPool,
    filter: &CommentFilter,
    page: &PageRequest,
) -> Result<Page<Comment>, CommentsRepoError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM comment");
    push_filter(&mut count, filter);
    let total_count: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {COMMENT_COLUMNS} FROM comment"));
    push_filter(&mut query, filter);
    if let Some(after) = page.after {
        query
            .push(format!(" AND (created_at, id) {} (", page.sort.seek_operator()))
            .push_bind(after.created_at)
            .push(", ")
            .push_bind(after.id)
            .push(")");
    }
    let direction = page.sort.as_sql();
    query
        .push(format!(" ORDER BY created_at {direction}, id {direction} LIMIT "))
        .push_bind(page.fetch_limit());

    let rows = query.build().fetch_all(pool).await?;
    let comments = rows.iter().map(map_comment).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::from_fetch(comments, total_count, page, Comment::cursor))
}

pub async fn list_replies(
    pool: &PgPool,
    parent_ids: &[Uuid],
    statuses: Option<&[CommentStatus]>,
) -> Result<Vec<Comment>, CommentsRepoError> {
    let mut query = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COMMENT_COLUMNS} FROM comment WHERE parent_comment_id = ANY("
    ));
    query.push_bind(parent_ids.to_vec()).push(")");
    if let Some(statuses) = statuses {
        query
            .push(" AND status = ANY(")
            .push_bind(status_names(statuses))
            .push(")");
    }
    query.push(" ORDER BY created_at ASC, id ASC");
    let rows = query.build().fetch_all(pool).await?;
    Ok(rows.iter().map(map_comment).collect::<Result<Vec<_>, _>>()?)
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CommentFilter) {
    builder.push(" WHERE TRUE");
    if filter.roots_only {
        builder.push(" AND parent_comment_id IS NULL");
    }
    if let Some(context) = filter.entity_context_id.as_ref() {
        builder.push(" AND entity_context_id = ").push_bind(context.clone());
    }
    if let Some(author) = filter.author_id.as_ref() {
        builder.push(" AND author_id = ").push_bind(author.clone());
    }
    if let Some(statuses) = filter.statuses.as_deref() {
        builder
            .push(" AND status = ANY(")
            .push_bind(status_names(statuses))
            .push(")");
    }
    if let Some(range) = filter.created_within {
        builder
            .push(" AND created_at BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
}

fn status_names(statuses: &[CommentStatus]) -> Vec<String> {
    statuses.iter().map(|status| status.as_str().to_string()).collect()
}

pub(crate) fn map_comment(row: &PgRow) -> Result<Comment, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<CommentStatus>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        organization_id: row.try_get("organization_id")?,
        entity_context_id: row.try_get("entity_context_id")?,
        status,
        parent_comment_id: row.try_get("parent_comment_id")?,
        section_id: row.try_get("section_id")?,
        is_reported: row.try_get("is_reported")?,
        version: row.try_get("version")?,
        meta: row.try_get("meta")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
