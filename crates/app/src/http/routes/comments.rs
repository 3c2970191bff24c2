use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::http::middleware::auth::AuthUser;
use crate::http::routes::api_error::{page_request, parse_id, parse_json, parse_optional_id, ApiError};
use crate::state::AppState;
use commentary_core::domain::comments::{Comment, CommentThread, NewComment};
use commentary_core::domain::reports::{CommentReport, NewReport};
use commentary_core::types::Page;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    pub entity_context_id: Option<String>,
    pub parent_comment_id: Option<String>,
    pub organization_id: Option<String>,
    pub section_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub reason: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsParams {
    pub entity_context_id: Option<String>,
    pub first: Option<String>,
    pub cursor: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MyCommentsParams {
    pub first: Option<String>,
    pub cursor: Option<String>,
    pub sort: Option<String>,
}

pub async fn post_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let payload: CreateCommentRequest = parse_json(&body)?;
    let parent_comment_id =
        parse_optional_id(payload.parent_comment_id.as_deref(), "parentCommentId")?;
    let input = NewComment {
        content: payload.content.unwrap_or_default(),
        entity_context_id: payload.entity_context_id.unwrap_or_default(),
        parent_comment_id,
        organization_id: payload.organization_id,
        section_id: payload.section_id,
    };
    let comment = state.comments.add_comment(&user.id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn put_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    body: Bytes,
) -> Result<Json<Comment>, ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    let payload: UpdateCommentRequest = parse_json(&body)?;
    let comment = state
        .comments
        .update_own_comment(comment_id, payload.content.unwrap_or_default(), &user.id)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    state.comments.delete_own_comment(comment_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<CommentReport>), ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    let payload: CreateReportRequest = parse_json(&body)?;
    let input = NewReport {
        reason: payload.reason.unwrap_or_default(),
        category: payload.category,
    };
    let report = state.comments.report_comment(comment_id, &user.id, input).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn get_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentsParams>,
) -> Result<Json<Page<CommentThread>>, ApiError> {
    let page = page_request(
        params.first.as_deref(),
        params.cursor.as_deref(),
        params.sort.as_deref(),
    )?;
    let entity_context_id = params.entity_context_id.unwrap_or_default();
    let threads = state
        .comments
        .find_comments_by_entity_context(&entity_context_id, &page)
        .await?;
    Ok(Json(threads))
}

pub async fn get_my_comments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MyCommentsParams>,
) -> Result<Json<Page<Comment>>, ApiError> {
    let page = page_request(
        params.first.as_deref(),
        params.cursor.as_deref(),
        params.sort.as_deref(),
    )?;
    let comments = state.comments.find_my_comments(&user.id, &page).await?;
    Ok(Json(comments))
}
