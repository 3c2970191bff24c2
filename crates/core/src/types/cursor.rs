//! Opaque keyset cursor over `(created_at, id)`.
//!
//! The token is the big-endian microsecond timestamp followed by the 16 UUID
//! bytes, base64url encoded without padding. Timestamps are kept at
//! microsecond precision everywhere so a cursor matches the stored row
//! exactly.

use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::sort::SortOrder;

const TOKEN_BYTES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Cursor { created_at, id }
    }

    pub fn encode(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        bytes[..8].copy_from_slice(&self.created_at.timestamp_micros().to_be_bytes());
        bytes[8..].copy_from_slice(self.id.as_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(token: &str) -> Result<Self, CoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| CoreError::InvalidCursor(token.to_string()))?;
        if bytes.len() != TOKEN_BYTES {
            return Err(CoreError::InvalidCursor(token.to_string()));
        }
        let mut micros = [0u8; 8];
        micros.copy_from_slice(&bytes[..8]);
        let created_at = DateTime::from_timestamp_micros(i64::from_be_bytes(micros))
            .ok_or_else(|| CoreError::InvalidCursor(token.to_string()))?;
        let id = Uuid::from_slice(&bytes[8..])
            .map_err(|_| CoreError::InvalidCursor(token.to_string()))?;
        Ok(Cursor { created_at, id })
    }

    /// Clients echo back whatever they were given, including a missing
    /// `endCursor` rendered as the string `"null"`.
    pub fn parse_optional(token: Option<&str>) -> Result<Option<Self>, CoreError> {
        match token.map(str::trim) {
            None | Some("") | Some("null") => Ok(None),
            Some(raw) => Self::decode(raw).map(Some),
        }
    }

    /// Whether a row keyed `(created_at, id)` lies strictly beyond this cursor
    /// when walking in `sort` order.
    pub fn admits(&self, created_at: DateTime<Utc>, id: Uuid, sort: SortOrder) -> bool {
        let ordering = (created_at, id).cmp(&(self.created_at, self.id));
        match sort {
            SortOrder::Asc => ordering == Ordering::Greater,
            SortOrder::Desc => ordering == Ordering::Less,
        }
    }
}
