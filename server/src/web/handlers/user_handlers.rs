// server/src/web/handlers/user_handlers.rs

//! Admin-only account management.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::model::{Role, UserId};
use storefront::Registration;
use tracing::instrument;
use validator::Validate;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
  #[validate(length(min = 1, max = 100, message = "First name is required"))]
  pub first_name: String,
  #[validate(length(min = 1, max = 100, message = "Last name is required"))]
  pub last_name: String,
  #[validate(email(message = "A valid email is required"))]
  pub email: String,
  #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
  pub password: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  /// `USER` when omitted.
  #[serde(default)]
  pub role: Option<String>,
}

pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  Ok(HttpResponse::Ok().json(app_state.accounts.list_users().await?))
}

pub async fn get_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<UserId>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  Ok(HttpResponse::Ok().json(app_state.accounts.get_user(path.into_inner()).await?))
}

pub async fn get_user_by_email_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  Ok(HttpResponse::Ok().json(app_state.accounts.get_user_by_email(&path.into_inner()).await?))
}

#[instrument(
    name = "handler::create_user",
    skip(app_state, auth_user, req_payload),
    fields(admin = %auth_user.email, req_email = %req_payload.email)
)]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateUserPayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let role = match payload.role.as_deref() {
    Some(raw) => raw.parse::<Role>()?,
    None => Role::User,
  };
  let registration = Registration {
    first_name: payload.first_name,
    last_name: payload.last_name,
    email: payload.email,
    password: payload.password,
    phone: payload.phone,
    address: payload.address,
  };
  let user = app_state.accounts.create_user(registration, role).await?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::delete_user", skip(app_state, auth_user, path), fields(admin = %auth_user.email))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<UserId>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  app_state.accounts.delete_user(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "User deleted."})))
}
