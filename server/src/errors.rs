// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Store(#[from] StoreError),

  /// A placement the core refused. Always a client error, including unknown products.
  #[error("Order rejected: {0}")]
  OrderRejected(StoreError),

  #[error("Authentication Failed: {0}")]
  Unauthorized(String),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Handlers that call into anyhow-returning helpers can still use `?`.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<StoreError>() {
      Ok(store_err) => AppError::Store(store_err),
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(errors: validator::ValidationErrors) -> Self {
    AppError::Validation(errors.to_string())
  }
}

fn store_status(err: &StoreError) -> StatusCode {
  match err {
    StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
    StoreError::InsufficientStock { .. }
    | StoreError::Validation(_)
    | StoreError::DuplicateEmail(_)
    | StoreError::DuplicateCategory(_) => StatusCode::BAD_REQUEST,
    StoreError::BadCredentials => StatusCode::UNAUTHORIZED,
    StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
    StoreError::InvalidTransition { .. } | StoreError::Conflict(_) => StatusCode::CONFLICT,
    StoreError::Persistence { .. } | StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Store(err) => store_status(err),
      AppError::OrderRejected(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
      AppError::OrderRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migration(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Log the full error; the client only gets a generic message.
      tracing::error!(application_error = %self, "Responding with server error");
      return HttpResponse::build(status).json(json!({"error": "An internal error occurred"}));
    }

    tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
    let message = match self {
      AppError::Store(err) | AppError::OrderRejected(err) => err.to_string(),
      AppError::Unauthorized(m) | AppError::Validation(m) => m.clone(),
      other => other.to_string(),
    };
    HttpResponse::build(status).json(json!({"error": message}))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
