//! Error body and request parsing shared by the comment and moderation
//! handlers.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use commentary_core::error::CoreError;
use commentary_core::service::CommentError;
use commentary_core::store::StoreError;
use commentary_core::types::{PageRequest, SortOrder};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid payload")]
    InvalidPayload,
    #[error("{0} is invalid")]
    InvalidParam(&'static str),
    #[error(transparent)]
    Comments(#[from] CommentError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Comments(CommentError::Invalid(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload | ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Comments(err) => match err {
                CommentError::CommentNotFound(_) | CommentError::ReportNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CommentError::NotAuthor(_) => StatusCode::FORBIDDEN,
                CommentError::Invalid(_) => StatusCode::BAD_REQUEST,
                CommentError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
                CommentError::Store(StoreError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload | ApiError::InvalidParam(_) => "INVALID_INPUT",
            ApiError::Comments(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
            code: self.code(),
        });
        (status, body).into_response()
    }
}

pub fn parse_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    if body.is_empty() {
        return Err(ApiError::InvalidPayload);
    }
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidPayload)
}

pub fn parse_id(value: &str, field: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::InvalidParam(field))
}

pub fn parse_optional_id(value: Option<&str>, field: &'static str) -> Result<Option<Uuid>, ApiError> {
    match non_empty(value) {
        Some(raw) => parse_id(raw, field).map(Some),
        None => Ok(None),
    }
}

/// Builds a page request from raw `first`, `cursor` and `sort` query values.
pub fn page_request(
    first: Option<&str>,
    cursor: Option<&str>,
    sort: Option<&str>,
) -> Result<PageRequest, ApiError> {
    let first = match non_empty(first) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| ApiError::InvalidParam("first"))?),
        None => None,
    };
    let sort = non_empty(sort).map(str::parse::<SortOrder>).transpose()?;
    Ok(PageRequest::new(first, cursor, sort)?)
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
