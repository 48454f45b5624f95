// server/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::ops::Deref;
use storefront::{Identity, StoreError};
use tracing::warn;

use crate::errors::{AppError, Result};
use crate::state::AppState;

/// The caller behind a valid bearer token.
///
/// The token only carries the email. The account (and with it the role) is looked up on
/// every request, so a deleted account or a changed role takes effect immediately.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub identity: Identity,
}

impl Deref for AuthenticatedUser {
  type Target = Identity;

  fn deref(&self) -> &Identity {
    &self.identity
  }
}

fn bearer_token(req: &HttpRequest) -> Result<String> {
  let value = req
    .headers()
    .get(header::AUTHORIZATION)
    .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?
    .to_str()
    .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

  value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .map(str::to_string)
    .ok_or_else(|| AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string()))
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not registered".to_string()))?;
      let token = token.map_err(|e| {
        warn!("AuthenticatedUser extractor: {}", e);
        e
      })?;
      let claims = state.tokens.verify(&token)?;

      match state.accounts.resolve_identity(&claims.sub).await {
        Ok(identity) => Ok(AuthenticatedUser { identity }),
        Err(StoreError::BadCredentials) => {
          warn!(subject = %claims.sub, "Token subject no longer has an account.");
          Err(AppError::Unauthorized("Account no longer exists".to_string()))
        }
        Err(e) => Err(e.into()),
      }
    })
  }
}
