use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;
use uuid::Uuid;

use commentary_core::domain::reports::{CommentReport, ReportStatus};
use commentary_core::store::ReportFilter;
use commentary_core::types::{Page, PageRequest};

const REPORT_COLUMNS: &str =
    "id, author_id, comment_id, reason, status, category, internal_note, created_at, updated_at";

#[derive(Debug, Error)]
pub enum ReportsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("reported comment {0} does not exist")]
    MissingComment(Uuid),
    #[error("report {0} does not exist")]
    MissingReport(Uuid),
}

/// Flags the comment and stores the report in one transaction.
pub async fn insert_report(pool: &PgPool, report: &CommentReport) -> Result<(), ReportsRepoError> {
    let mut tx = pool.begin().await?;
    let flagged = sqlx::query(
        r#"
        UPDATE comment
        SET is_reported = TRUE,
            version = version + 1,
            updated_at = $2
        WHERE id = $1
        "#,
    )
    .bind(report.comment_id)
    .bind(report.created_at)
    .execute(&mut *tx)
    .await?;
    if flagged.rows_affected() == 0 {
        return Err(ReportsRepoError::MissingComment(report.comment_id));
    }
    sqlx::query(
        r#"
        INSERT INTO comment_report (
            id,
            author_id,
            comment_id,
            reason,
            status,
            category,
            internal_note,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(report.id)
    .bind(&report.author_id)
    .bind(report.comment_id)
    .bind(&report.reason)
    .bind(report.status.as_str())
    .bind(report.category.as_deref())
    .bind(report.internal_note.as_deref())
    .bind(report.created_at)
    .bind(report.updated_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn find_report(pool: &PgPool, id: Uuid) -> Result<Option<CommentReport>, ReportsRepoError> {
    let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM comment_report WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(map_report).transpose()?)
}

pub async fn update_report(
    pool: &PgPool,
    report: &CommentReport,
) -> Result<CommentReport, ReportsRepoError> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE comment_report
        SET status = $2,
            category = $3,
            internal_note = $4,
            updated_at = $5
        WHERE id = $1
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(report.id)
    .bind(report.status.as_str())
    .bind(report.category.as_deref())
    .bind(report.internal_note.as_deref())
    .bind(report.updated_at)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => Ok(map_report(&row)?),
        None => Err(ReportsRepoError::MissingReport(report.id)),
    }
}

pub async fn list_reports(
    pool: &PgPool,
    filter: &ReportFilter,
    page: &PageRequest,
) -> Result<Page<CommentReport>, ReportsRepoError> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM comment_report");
    push_filter(&mut count, filter);
    let total_count = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut query =
        QueryBuilder::<Postgres>::new(format!("SELECT {REPORT_COLUMNS} FROM comment_report"));
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
    let reports = rows.iter().map(map_report).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::from_fetch(reports, total_count, page, CommentReport::cursor))
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReportFilter) {
    builder.push(" WHERE TRUE");
    if let Some(comment_id) = filter.comment_id {
        builder.push(" AND comment_id = ").push_bind(comment_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

fn map_report(row: &PgRow) -> Result<CommentReport, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ReportStatus>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
    Ok(CommentReport {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        comment_id: row.try_get("comment_id")?,
        reason: row.try_get("reason")?,
        status,
        category: row.try_get("category")?,
        internal_note: row.try_get("internal_note")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
