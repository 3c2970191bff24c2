use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::http::routes::api_error::{
    non_empty, page_request, parse_json, parse_id, parse_optional_id, ApiError,
};
use crate::state::AppState;
use commentary_core::domain::reports::{CommentReport, ReportPatch, ReportStatus};
use commentary_core::store::ReportFilter;
use commentary_core::types::Page;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsParams {
    pub comment_id: Option<String>,
    pub status: Option<String>,
    pub first: Option<String>,
    pub cursor: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateReportRequest {
    pub status: Option<String>,
    pub category: Option<String>,
    pub internal_note: Option<String>,
}

pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportsParams>,
) -> Result<Json<Page<CommentReport>>, ApiError> {
    let page = page_request(
        params.first.as_deref(),
        params.cursor.as_deref(),
        params.sort.as_deref(),
    )?;
    let filter = ReportFilter {
        comment_id: parse_optional_id(params.comment_id.as_deref(), "commentId")?,
        status: non_empty(params.status.as_deref())
            .map(str::parse::<ReportStatus>)
            .transpose()?,
    };
    let reports = state.comments.admin_find_reports(filter, &page).await?;
    Ok(Json(reports))
}

pub async fn put_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    body: Bytes,
) -> Result<Json<CommentReport>, ApiError> {
    let report_id = parse_id(&report_id, "id")?;
    let payload: UpdateReportRequest = parse_json(&body)?;
    let patch = ReportPatch {
        status: non_empty(payload.status.as_deref())
            .map(str::parse::<ReportStatus>)
            .transpose()?,
        category: payload.category,
        internal_note: payload.internal_note,
    };
    let report = state.comments.admin_update_report(report_id, patch).await?;
    Ok(Json(report))
}
