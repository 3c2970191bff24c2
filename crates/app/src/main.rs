mod cli;
mod config;
mod consumers;
mod http;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::http::middleware::auth::{self, AuthError};
use crate::http::HttpError;
use crate::wiring::WiringError;
use commentary_infra::db::{connect_lazy, run_migrations};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid cli: {0}")]
    InvalidCli(String),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("db error: {0}")]
    Db(#[from] commentary_infra::db::DbPoolError),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    config::load_dotenv()?;

    if let Some(user_id) = cli.issue_token.as_deref() {
        let secret = config::token_secret_from_env().ok_or_else(|| {
            AppError::InvalidCli("COMMENTARY_TOKEN_SECRET is required to issue tokens".to_string())
        })?;
        let token = auth::issue_token(&secret, user_id, cli.admin, cli.token_ttl_secs)?;
        info!(user_id, admin = cli.admin, ttl_secs = cli.token_ttl_secs, "token issued");
        println!("{token}");
        return Ok(());
    }

    let config = config::AppConfig::from_env()?;
    let pool = connect_lazy(
        &config.database_url,
        config.db_max_connections,
        config.request_timeout,
    )?;
    if cli.mode.run_migrations() {
        run_migrations(&pool).await?;
    }
    if !cli.mode.run_api() {
        info!("migrations complete; exiting");
        return Ok(());
    }

    let state = wiring::build_state(config, pool)?;
    let consumers = consumers::spawn_all(&state);

    let addr = state.config.http_addr;
    let http_state = state.clone();
    let api = tokio::spawn(async move {
        info!(%addr, "http server starting");
        http::serve(addr, http_state).await
    });

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
        res = api => {
            res??;
        }
    }

    for consumer in consumers {
        consumer.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}
