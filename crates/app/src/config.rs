use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use commentary_core::domain::comments::CommentStatus;
use commentary_core::domain::settings::PluginSettings;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub token_secret: Option<String>,
    pub default_status: CommentStatus,
    pub visible_statuses: Vec<CommentStatus>,
    pub event_capacity: usize,
    pub event_webhook_url: Option<String>,
    pub event_webhook_secret: Option<String>,
    pub request_timeout: Duration,
    pub cors: CorsPolicy,
}

/// Which browser origins may call the API cross-site.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CorsPolicy {
    #[default]
    Disabled,
    AnyOrigin,
    Origins(Vec<HeaderValue>),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("COMMENTARY_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let database_url = read_optional_string("COMMENTARY_DATABASE_URL")
            .ok_or(ConfigError::Missing("COMMENTARY_DATABASE_URL"))?;
        let db_max_connections = read_u32("COMMENTARY_DB_MAX_CONNECTIONS", 5)?;
        let token_secret = token_secret_from_env();
        let default_status = parse_status(
            "COMMENTARY_DEFAULT_STATUS",
            &read_string("COMMENTARY_DEFAULT_STATUS", "published"),
        )?;
        let visible_statuses = parse_status_list(
            "COMMENTARY_VISIBLE_STATUSES",
            &read_string("COMMENTARY_VISIBLE_STATUSES", "published"),
        )?;
        let event_capacity = read_usize("COMMENTARY_EVENT_CAPACITY", 1024)?;
        if event_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "COMMENTARY_EVENT_CAPACITY",
                "0".to_string(),
            ));
        }
        let event_webhook_url = read_optional_string("COMMENTARY_EVENT_WEBHOOK_URL");
        let event_webhook_secret = read_optional_string("COMMENTARY_EVENT_WEBHOOK_SECRET");
        let request_timeout_secs = read_u64("COMMENTARY_REQUEST_TIMEOUT_SECS", 15)?;
        let cors = parse_cors_policy(
            "COMMENTARY_CORS_ALLOW_ORIGINS",
            &std::env::var("COMMENTARY_CORS_ALLOW_ORIGINS").unwrap_or_default(),
        )?;

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            token_secret,
            default_status,
            visible_statuses,
            event_capacity,
            event_webhook_url,
            event_webhook_secret,
            request_timeout: Duration::from_secs(request_timeout_secs),
            cors,
        })
    }

    pub fn plugin_settings(&self) -> PluginSettings {
        PluginSettings {
            default_status: self.default_status,
            visible_statuses: self.visible_statuses.clone(),
        }
    }
}

/// The signing secret alone, for operator commands that never touch the
/// database.
pub fn token_secret_from_env() -> Option<String> {
    read_optional_string("COMMENTARY_TOKEN_SECRET")
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&contents) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_status(key: &'static str, raw: &str) -> Result<CommentStatus, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue(key, raw.to_string()))
}

fn parse_status_list(key: &'static str, raw: &str) -> Result<Vec<CommentStatus>, ConfigError> {
    let mut statuses = Vec::new();
    for item in split_list(raw) {
        let status = parse_status(key, &item)?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    if statuses.is_empty() {
        return Err(ConfigError::InvalidValue(key, raw.to_string()));
    }
    Ok(statuses)
}

/// `*` alone opens the API to every origin; otherwise each entry must be a
/// bare `http(s)://host[:port]` origin.
fn parse_cors_policy(key: &'static str, raw: &str) -> Result<CorsPolicy, ConfigError> {
    let entries = split_list(raw);
    if entries.iter().any(|entry| entry == "*") {
        if entries.len() > 1 {
            return Err(ConfigError::InvalidValue(key, raw.to_string()));
        }
        return Ok(CorsPolicy::AnyOrigin);
    }
    if entries.is_empty() {
        return Ok(CorsPolicy::Disabled);
    }
    let mut origins = Vec::with_capacity(entries.len());
    for entry in entries {
        let host = entry
            .strip_prefix("https://")
            .or_else(|| entry.strip_prefix("http://"))
            .unwrap_or_default();
        if host.is_empty() || host.contains('/') {
            return Err(ConfigError::InvalidValue(key, entry));
        }
        let origin = HeaderValue::from_str(&entry).map_err(|_| ConfigError::InvalidValue(key, entry.clone()))?;
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }
    Ok(CorsPolicy::Origins(origins))
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(parse_dotenv_line)
        .collect()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = parse_dotenv_value(value.trim());
    Some((key.to_string(), value))
}

fn parse_dotenv_value(value: &str) -> String {
    if let Some(stripped) = value.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        return unescape_double_quoted(stripped);
    }
    if let Some(stripped) = value.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')) {
        return stripped.to_string();
    }
    value.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => output.push('\n'),
                Some('r') => output.push('\r'),
                Some('t') => output.push('\t'),
                Some('\\') => output.push('\\'),
                Some('"') => output.push('"'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            }
        } else {
            output.push(ch);
        }
    }
    output
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        AppConfig {
            http_addr: "127.0.0.1:0".parse().expect("static socket address"),
            database_url: "postgres://localhost/commentary_test".to_string(),
            db_max_connections: 1,
            token_secret: Some("test-secret".to_string()),
            default_status: CommentStatus::Published,
            visible_statuses: vec![CommentStatus::Published],
            event_capacity: 16,
            event_webhook_url: None,
            event_webhook_secret: None,
            request_timeout: Duration::from_secs(5),
            cors: CorsPolicy::Disabled,
        }
    }
}
