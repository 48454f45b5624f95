// server/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

/// HMAC keys shorter than this are rejected at startup.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" | "in-memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Unknown STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Text,
  Json,
}

impl LogFormat {
  /// Read before the rest of the configuration so startup errors are logged in the
  /// requested format. Unknown values fall back to text.
  pub fn from_env() -> Self {
    match env::var("LOG_FORMAT") {
      Ok(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
      _ => LogFormat::Text,
    }
  }
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "text" | "pretty" => Ok(LogFormat::Text),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Unknown LOG_FORMAT '{}'", other))),
    }
  }
}

#[derive(Clone)] // Clone is useful if parts of config are passed around
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub store_backend: StoreBackend,
  /// Required when `store_backend` is Postgres.
  pub database_url: Option<String>,
  pub database_max_connections: u32,

  pub jwt_secret: String,
  pub jwt_expiration_secs: i64,

  // Startup data
  pub seed_db: bool,
  pub admin_email: Option<String>,
  pub admin_password: Option<String>,

  pub strict_status_transitions: bool,
  pub log_format: LogFormat,
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("database_max_connections", &self.database_max_connections)
      .field("jwt_secret", &"[REDACTED]")
      .field("jwt_expiration_secs", &self.jwt_expiration_secs)
      .field("seed_db", &self.seed_db)
      .field("admin_email", &self.admin_email)
      .field("strict_status_transitions", &self.strict_status_transitions)
      .field("log_format", &self.log_format)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source. `from_env` passes the process
  /// environment; tests pass a map.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let env_or = |var_name: &str, default: &str| get_env(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = env_or("SERVER_HOST", "127.0.0.1");
    let server_port = env_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = env_or("STORE_BACKEND", "postgres").parse::<StoreBackend>()?;
    let database_url = get_env("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "DATABASE_URL is required when STORE_BACKEND is postgres".to_string(),
      ));
    }
    let database_max_connections = env_or("DATABASE_MAX_CONNECTIONS", "10")
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e)))?;

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.len() < MIN_JWT_SECRET_LEN {
      return Err(AppError::Config(format!(
        "JWT_SECRET must be at least {} bytes long",
        MIN_JWT_SECRET_LEN
      )));
    }
    let jwt_expiration_secs = env_or("JWT_EXPIRATION_SECS", "86400")
      .parse::<i64>()
      .ok()
      .filter(|secs| *secs > 0)
      .ok_or_else(|| AppError::Config("JWT_EXPIRATION_SECS must be a positive number of seconds".to_string()))?;

    let seed_db = env_or("SEED_DB", "false")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;
    let admin_email = get_env("ADMIN_EMAIL").ok();
    let admin_password = get_env("ADMIN_PASSWORD").ok();
    if admin_email.is_some() != admin_password.is_some() {
      return Err(AppError::Config(
        "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
      ));
    }

    let strict_status_transitions = env_or("STRICT_STATUS_TRANSITIONS", "false")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid STRICT_STATUS_TRANSITIONS value: {}", e)))?;
    let log_format = env_or("LOG_FORMAT", "text").parse::<LogFormat>()?;

    let config = Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      jwt_secret,
      jwt_expiration_secs,
      seed_db,
      admin_email,
      admin_password,
      strict_status_transitions,
      log_format,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
