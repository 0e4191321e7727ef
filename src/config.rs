use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Authentication mode for the application.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// No authentication required - every request is accepted.
    Unauthenticated,
    /// Password authentication with an Argon2 hash.
    Password(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub auth_mode: AuthMode,
}

/// The magic value that disables authentication.
pub const UNAUTHENTICATED_MAGIC: &str = "DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "SPENDWISE_PASSWORD_HASH is not set. Set a valid Argon2 hash or \
         'DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS' to explicitly allow unauthenticated access."
    )]
    MissingPasswordHash,

    #[error(
        "Invalid SPENDWISE_PASSWORD_HASH: must start with '$argon2id$' or be set to \
         'DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS'. Got: {0}..."
    )]
    InvalidPasswordHash(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_mode = parse_auth_mode(env::var("SPENDWISE_PASSWORD_HASH").ok())?;

        Ok(Self {
            host: env::var("SPENDWISE_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("SPENDWISE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7070),
            database_path: env::var("SPENDWISE_DATABASE_URL")
                .map(|v| database_path_from_url(&v))
                .unwrap_or_else(|_| PathBuf::from("data/spendwise.db")),
            migrations_path: env::var("SPENDWISE_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
            auth_mode,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_auth_mode(value: Option<String>) -> Result<AuthMode, ConfigError> {
    match value {
        Some(hash) if hash == UNAUTHENTICATED_MAGIC => Ok(AuthMode::Unauthenticated),
        Some(hash) if hash.starts_with("$argon2id$") => Ok(AuthMode::Password(hash)),
        Some(hash) if hash.is_empty() => Err(ConfigError::MissingPasswordHash),
        Some(hash) => Err(ConfigError::InvalidPasswordHash(
            hash.chars().take(20).collect(),
        )),
        None => Err(ConfigError::MissingPasswordHash),
    }
}

fn database_path_from_url(url: &str) -> PathBuf {
    PathBuf::from(
        url.strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url),
    )
}
