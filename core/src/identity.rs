// core/src/identity.rs

//! The caller on whose behalf a core operation runs.
//!
//! The HTTP boundary resolves an [`Identity`] from the bearer token and performs the
//! role checks below before it invokes a service. Services that care about ownership
//! (order placement) take the identity as an explicit argument.

use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::model::{Role, User, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub user_id: UserId,
  pub email: String,
  pub role: Role,
}

impl Identity {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  pub fn require_admin(&self) -> StoreResult<()> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(StoreError::Forbidden(format!("{} requires the ADMIN role", self.email)))
    }
  }

  /// Passes when the caller is `user_id` or an admin.
  pub fn require_self_or_admin(&self, user_id: UserId) -> StoreResult<()> {
    if self.user_id == user_id || self.is_admin() {
      Ok(())
    } else {
      Err(StoreError::Forbidden(format!(
        "{} cannot access resources of user {}",
        self.email, user_id
      )))
    }
  }
}

impl From<&User> for Identity {
  fn from(user: &User) -> Self {
    Self {
      user_id: user.id,
      email: user.email.clone(),
      role: user.role,
    }
  }
}
