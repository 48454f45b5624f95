// server/src/lib.rs

//! HTTP server for the storefront: configuration, bearer tokens, the PostgreSQL store
//! and the actix-web routes over the `storefront` core.

pub mod config;
pub mod errors;
pub mod postgres;
pub mod state;
pub mod telemetry;
pub mod tokens;
pub mod web;

pub use crate::config::{AppConfig, LogFormat, StoreBackend};
pub use crate::errors::{AppError, Result};
pub use crate::postgres::PgStore;
pub use crate::state::AppState;
pub use crate::tokens::{Claims, TokenIssuer};
