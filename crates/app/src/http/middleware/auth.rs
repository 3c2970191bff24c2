use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::state::AppState;

/// Identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub is_admin: bool,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication not configured")]
    MissingConfig,
    #[error("bearer token required")]
    MissingToken,
    #[error("bearer token invalid")]
    InvalidToken,
    #[error("admin privileges required")]
    Forbidden,
    #[error("token subject must not be empty")]
    EmptySubject,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String,
    #[serde(default)]
    adm: bool,
    exp: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, &request)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&state, &request)?;
    if !user.is_admin {
        debug!(user_id = %user.id, path = %request.uri().path(), "admin route refused");
        return Err(AuthError::Forbidden);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn authenticate<B>(state: &AppState, request: &Request<B>) -> Result<AuthUser, AuthError> {
    let secret = state
        .config
        .token_secret
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingConfig)?;
    let token = extract_bearer_token(request).ok_or(AuthError::MissingToken)?;
    let payload = verify_token(secret, &token).ok_or(AuthError::InvalidToken)?;
    Ok(AuthUser {
        id: payload.sub,
        is_admin: payload.adm,
    })
}

pub fn issue_token(
    secret: &str,
    user_id: &str,
    admin: bool,
    max_age_secs: i64,
) -> Result<String, AuthError> {
    let sub = user_id.trim();
    if sub.is_empty() {
        return Err(AuthError::EmptySubject);
    }
    let exp = Utc::now().timestamp().saturating_add(max_age_secs);
    let payload = TokenPayload {
        sub: sub.to_string(),
        adm: admin,
        exp,
    };
    let json = serde_json::to_vec(&payload).map_err(|_| AuthError::InvalidToken)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(json);
    let signature = sign_token(secret, &payload_b64);
    Ok(format!("{payload_b64}.{signature}"))
}

fn verify_token(secret: &str, token: &str) -> Option<TokenPayload> {
    let (payload_b64, sig) = token.split_once('.')?;
    if payload_b64.is_empty() || sig.is_empty() {
        return None;
    }
    let sig = URL_SAFE_NO_PAD.decode(sig.as_bytes()).ok()?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&sig).ok()?;
    let payload = decode_payload(payload_b64)?;
    if payload.sub.trim().is_empty() || payload.exp <= Utc::now().timestamp() {
        return None;
    }
    Some(payload)
}

fn decode_payload(payload_b64: &str) -> Option<TokenPayload> {
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn sign_token(secret: &str, payload_b64: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("hmac can take key of any size");
    mac.update(payload_b64.as_bytes());
    let raw = mac.finalize().into_bytes();
    URL_SAFE_NO_PAD.encode(raw)
}

fn extract_bearer_token<B>(request: &Request<B>) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let value = header.trim().strip_prefix("Bearer ")?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingConfig => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::EmptySubject => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingConfig => "AUTH_UNAVAILABLE",
            AuthError::Forbidden => "FORBIDDEN",
            _ => "UNAUTHORIZED",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
            code: self.code(),
        });
        (status, body).into_response()
    }
}
