// server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storefront::model::Role;
use storefront::Registration;
use tracing::{info, instrument};
use validator::Validate;

use crate::errors::AppError;
use crate::state::AppState;

// --- Request DTOs ---
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestPayload {
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
}

impl From<RegisterRequestPayload> for Registration {
  fn from(payload: RegisterRequestPayload) -> Self {
    Registration {
      first_name: payload.first_name,
      last_name: payload.last_name,
      email: payload.email,
      password: payload.password,
      phone: payload.phone,
      address: payload.address,
    }
  }
}

#[derive(Deserialize, Debug, Validate)]
pub struct LoginRequestPayload {
  #[validate(length(min = 1, message = "Email is required"))]
  pub email: String,
  #[validate(length(min = 1, message = "Password is required"))]
  pub password: String,
}

// --- Response DTOs ---
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub role: Role,
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::register",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  payload.validate()?;

  let user = app_state.accounts.register(payload.into()).await?;
  info!(user_id = user.id, "Registration successful.");

  Ok(HttpResponse::Ok().json(json!({
      "message": "User registered successfully.",
      "userId": user.id,
  })))
}

#[instrument(
    name = "handler::login",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequestPayload>,
) -> Result<HttpResponse, AppError> {
  req_payload.validate()?;

  let user = app_state
    .accounts
    .authenticate(&req_payload.email, &req_payload.password)
    .await?;
  let token = app_state.tokens.issue(&user.email)?;
  info!(user_id = user.id, "Login successful.");

  Ok(HttpResponse::Ok().json(LoginResponse {
    token,
    email: user.email,
    first_name: user.first_name,
    last_name: user.last_name,
    role: user.role,
  }))
}
