// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::OrderStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient stock for {product_name}. Available: {available}, requested: {requested}")]
    InsufficientStock {
        product_name: String,
        available: i32,
        requested: i32,
    },

    #[error("Email is already in use: {0}")]
    DuplicateEmail(String),

    #[error("A category named '{0}' already exists")]
    DuplicateCategory(String),

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Order status cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence failure. Source: {source}")]
    Persistence {
        #[source]
        source: AnyhowError,
    },

    #[error("Internal storefront error: {0}")]
    Internal(String),
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    StoreError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  /// True for failures caused by the request itself rather than by the store.
  pub fn is_client_error(&self) -> bool {
    !matches!(self, StoreError::Persistence { .. } | StoreError::Internal(_))
  }
}

// Store drivers report through anyhow; everything that reaches the core that way
// is a persistence failure.
impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Persistence { source: err }
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
