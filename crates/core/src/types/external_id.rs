use std::fmt;

use crate::error::CoreError;

/// Identifier owned by a system outside this service (users, organizations,
/// the entity a thread hangs off). Stored as `varchar(255)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

pub const MAX_EXTERNAL_ID_LEN: usize = 255;

impl ExternalId {
    pub fn parse(field: &'static str, value: &str) -> Result<Self, CoreError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Missing(field));
        }
        if trimmed.len() > MAX_EXTERNAL_ID_LEN {
            return Err(CoreError::TooLong(field));
        }
        Ok(ExternalId(trimmed.to_string()))
    }

    /// Like [`ExternalId::parse`], but blank input means "not provided".
    pub fn parse_optional(
        field: &'static str,
        value: Option<&str>,
    ) -> Result<Option<Self>, CoreError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Self::parse(field, raw).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
