// server/src/tokens.rs

//! Stateless bearer tokens: HS256 JWTs whose subject is the account email.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub iat: i64,
  pub exp: i64,
}

pub struct TokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validation: Validation,
  lifetime: Duration,
}

impl TokenIssuer {
  pub fn new(secret: &[u8], lifetime_secs: i64) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      lifetime: Duration::seconds(lifetime_secs),
    }
  }

  pub fn issue(&self, email: &str) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: email.to_string(),
      iat: now.timestamp(),
      exp: (now + self.lifetime).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
  }

  /// Checks signature and expiry. Every failure is an `Unauthorized`.
  pub fn verify(&self, token: &str) -> Result<Claims> {
    match decode::<Claims>(token, &self.decoding, &self.validation) {
      Ok(data) => {
        debug!(subject = %data.claims.sub, "Bearer token verified.");
        Ok(data.claims)
      }
      Err(e) => {
        warn!(error = %e, "Rejected bearer token.");
        Err(AppError::Unauthorized("Invalid or expired token".to_string()))
      }
    }
  }
}
