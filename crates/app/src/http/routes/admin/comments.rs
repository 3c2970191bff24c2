use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::http::middleware::auth::AuthUser;
use crate::http::routes::api_error::{non_empty, page_request, parse_id, parse_json, ApiError};
use crate::state::AppState;
use commentary_core::domain::comments::{Comment, CommentPatch, CommentStatus, CommentThread};
use commentary_core::service::{AdminCommentFilter, RepublishFilter};
use commentary_core::types::{DateRange, Page};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCommentsParams {
    pub entity_context_id: Option<String>,
    pub status: Option<String>,
    pub first: Option<String>,
    pub cursor: Option<String>,
    pub sort: Option<String>,
}

/// Moderation patch. An explicit `"meta": null` deserializes the same as a
/// missing key and leaves the stored meta untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUpdateCommentRequest {
    pub status: Option<String>,
    pub content: Option<String>,
    pub meta: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepublishRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub entity_context_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepublishResponse {
    pub republished_count: usize,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<AdminCommentsParams>,
) -> Result<Json<Page<CommentThread>>, ApiError> {
    let page = page_request(
        params.first.as_deref(),
        params.cursor.as_deref(),
        params.sort.as_deref(),
    )?;
    let status = non_empty(params.status.as_deref())
        .map(str::parse::<CommentStatus>)
        .transpose()?;
    let filter = AdminCommentFilter {
        entity_context_id: non_empty(params.entity_context_id.as_deref()).map(str::to_string),
        status,
    };
    let threads = state.comments.admin_find_comments(filter, &page).await?;
    Ok(Json(threads))
}

pub async fn put_comment(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    body: Bytes,
) -> Result<Json<Comment>, ApiError> {
    let comment_id = parse_id(&comment_id, "id")?;
    let payload: AdminUpdateCommentRequest = parse_json(&body)?;
    let patch = build_patch(payload)?;
    let comment = state.comments.admin_update_comment(comment_id, patch).await?;
    info!(admin_id = %admin.id, comment_id = %comment.id, "admin comment update");
    Ok(Json(comment))
}

pub async fn soft_delete_comment(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let comment_id = parse_id(&comment_id, "id")?;
    state.comments.admin_soft_delete_comment(comment_id).await?;
    info!(admin_id = %admin.id, %comment_id, "admin soft delete");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hard_delete_comment(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let comment_id = parse_id(&comment_id, "id")?;
    state.comments.admin_hard_delete_comment(comment_id).await?;
    info!(admin_id = %admin.id, %comment_id, "admin hard delete");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn republish_comments(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RepublishResponse>, ApiError> {
    let payload: RepublishRequest = parse_json(&body)?;
    let range = match (
        non_empty(payload.start_date.as_deref()),
        non_empty(payload.end_date.as_deref()),
    ) {
        (Some(start), Some(end)) => Some(DateRange::parse(start, end)?),
        (None, None) => None,
        (Some(_), None) => return Err(ApiError::InvalidParam("endDate")),
        (None, Some(_)) => return Err(ApiError::InvalidParam("startDate")),
    };
    let filter = RepublishFilter::new(range, payload.entity_context_id)?;
    let republished_count = state.comments.admin_republish_comments(filter).await?;
    Ok(Json(RepublishResponse { republished_count }))
}

fn build_patch(payload: AdminUpdateCommentRequest) -> Result<CommentPatch, ApiError> {
    let status = match payload.status.as_deref() {
        Some(raw) if raw.trim().is_empty() => return Err(ApiError::InvalidParam("status")),
        Some(raw) => Some(raw.parse::<CommentStatus>()?),
        None => None,
    };
    let content = match payload.content {
        Some(raw) if raw.trim().is_empty() => return Err(ApiError::InvalidParam("content")),
        other => other,
    };
    let meta = match payload.meta {
        None => None,
        Some(value @ Value::Object(_)) => Some(value),
        Some(_) => return Err(ApiError::InvalidParam("meta")),
    };
    Ok(CommentPatch {
        status,
        content,
        meta,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_patch, AdminUpdateCommentRequest};
    use crate::http::routes::api_error::ApiError;
    use commentary_core::domain::comments::CommentStatus;

    fn request(value: serde_json::Value) -> AdminUpdateCommentRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let patch = build_patch(request(json!({ "status": "approved" }))).unwrap();
        assert_eq!(patch.status, Some(CommentStatus::Approved));
        assert!(patch.content.is_none());
        assert!(patch.meta.is_none());
    }

    #[test]
    fn null_meta_is_a_no_op() {
        let patch = build_patch(request(json!({ "content": "edited", "meta": null }))).unwrap();
        assert_eq!(patch.content.as_deref(), Some("edited"));
        assert!(patch.meta.is_none());
    }

    #[test]
    fn blank_strings_and_non_object_meta_are_rejected() {
        assert!(matches!(
            build_patch(request(json!({ "content": "" }))),
            Err(ApiError::InvalidParam("content"))
        ));
        assert!(matches!(
            build_patch(request(json!({ "status": " " }))),
            Err(ApiError::InvalidParam("status"))
        ));
        assert!(matches!(
            build_patch(request(json!({ "meta": [1, 2] }))),
            Err(ApiError::InvalidParam("meta"))
        ));
    }

    #[test]
    fn unknown_status_and_fields_are_rejected() {
        assert!(build_patch(request(json!({ "status": "hidden" }))).is_err());
        let parsed: Result<AdminUpdateCommentRequest, _> =
            serde_json::from_value(json!({ "status": "approved", "pinned": true }));
        assert!(parsed.is_err());
    }
}
