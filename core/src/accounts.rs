// core/src/accounts.rs

//! Registration, login and admin account management.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::credentials;
use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;
use crate::model::{NewUser, Role, User, UserId};
use crate::store::Storefront;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Self-service sign-up data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
}

pub struct AccountService {
  store: Arc<dyn Storefront>,
}

impl AccountService {
  pub fn new<S: Storefront + 'static>(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Creates a `USER` account.
  #[instrument(name = "accounts::register", skip(self, registration), fields(email = %registration.email), err(Display))]
  pub async fn register(&self, registration: Registration) -> StoreResult<User> {
    self.create_account(registration, Role::User).await
  }

  /// Creates an account with an explicit role. Reserved for admins at the boundary.
  #[instrument(name = "accounts::create_user", skip(self, registration), fields(email = %registration.email), err(Display))]
  pub async fn create_user(&self, registration: Registration, role: Role) -> StoreResult<User> {
    self.create_account(registration, role).await
  }

  /// Checks credentials. Unknown emails and wrong passwords fail the same way.
  #[instrument(name = "accounts::authenticate", skip(self, password), err(Display))]
  pub async fn authenticate(&self, email: &str, password: &str) -> StoreResult<User> {
    let email = normalize_email(email);
    let user = match self.store.find_user_by_email(&email).await? {
      Some(user) => user,
      None => {
        warn!("Login attempt for an unknown email.");
        return Err(StoreError::BadCredentials);
      }
    };

    if credentials::verify_password(&user.password_hash, password)? {
      info!(user_id = user.id, "User authenticated.");
      Ok(user)
    } else {
      warn!(user_id = user.id, "Login attempt with a wrong password.");
      Err(StoreError::BadCredentials)
    }
  }

  /// Maps a token subject back to a live account.
  pub async fn resolve_identity(&self, email: &str) -> StoreResult<Identity> {
    self
      .store
      .find_user_by_email(&normalize_email(email))
      .await?
      .map(|user| Identity::from(&user))
      .ok_or(StoreError::BadCredentials)
  }

  pub async fn list_users(&self) -> StoreResult<Vec<User>> {
    self.store.list_users().await
  }

  pub async fn get_user(&self, id: UserId) -> StoreResult<User> {
    self
      .store
      .find_user(id)
      .await?
      .ok_or_else(|| StoreError::not_found("User", id))
  }

  pub async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
    let email = normalize_email(email);
    self
      .store
      .find_user_by_email(&email)
      .await?
      .ok_or_else(|| StoreError::not_found("User", email))
  }

  pub async fn email_exists(&self, email: &str) -> StoreResult<bool> {
    self.store.email_exists(&normalize_email(email)).await
  }

  /// Deleting an unknown user is a no-op; a user who owns orders cannot be deleted.
  #[instrument(name = "accounts::delete_user", skip(self), err(Display))]
  pub async fn delete_user(&self, id: UserId) -> StoreResult<()> {
    if !self.store.delete_user(id).await? {
      warn!(user_id = id, "Delete requested for a user that does not exist.");
    }
    Ok(())
  }

  async fn create_account(&self, registration: Registration, role: Role) -> StoreResult<User> {
    let registration = validate_registration(registration)?;
    if self.store.email_exists(&registration.email).await? {
      warn!("Registration attempt with an email already in use.");
      return Err(StoreError::DuplicateEmail(registration.email));
    }

    let password_hash = credentials::hash_password(&registration.password)?;
    let user = self
      .store
      .insert_user(NewUser {
        first_name: registration.first_name,
        last_name: registration.last_name,
        email: registration.email,
        password_hash,
        role,
        phone: registration.phone,
        address: registration.address,
      })
      .await?;
    info!(user_id = user.id, role = %user.role, "Account created.");
    Ok(user)
  }
}

fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_registration(registration: Registration) -> StoreResult<Registration> {
  let first_name = registration.first_name.trim().to_string();
  let last_name = registration.last_name.trim().to_string();
  if first_name.is_empty() || last_name.is_empty() {
    return Err(StoreError::Validation("First and last name are required.".to_string()));
  }

  let email = normalize_email(&registration.email);
  let well_formed = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
    None => false,
  };
  if !well_formed {
    return Err(StoreError::Validation("A valid email is required.".to_string()));
  }

  let password = &registration.password;
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(StoreError::Validation(format!(
      "Password must be at least {} characters long.",
      MIN_PASSWORD_LEN
    )));
  }
  if !password.chars().any(|c| c.is_ascii_alphabetic()) || !password.chars().any(|c| c.is_ascii_digit()) {
    return Err(StoreError::Validation(
      "Password must contain at least one letter and one digit.".to_string(),
    ));
  }

  Ok(Registration {
    first_name,
    last_name,
    email,
    phone: non_blank(registration.phone),
    address: non_blank(registration.address),
    password: registration.password,
  })
}
