// server/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use crate::tokens::TokenIssuer;
use std::sync::Arc;
use storefront::seed::{ensure_admin, seed_catalog};
use storefront::{AccountService, CatalogService, OrderService, StatusPolicy, Storefront};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<CatalogService>,
  pub accounts: Arc<AccountService>,
  pub orders: Arc<OrderService>,
  pub tokens: Arc<TokenIssuer>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Wires every service to one store backend.
  pub fn new<S: Storefront + 'static>(store: Arc<S>, config: Arc<AppConfig>) -> Self {
    let policy = if config.strict_status_transitions {
      StatusPolicy::Strict
    } else {
      StatusPolicy::Permissive
    };

    Self {
      catalog: Arc::new(CatalogService::new(store.clone())),
      accounts: Arc::new(AccountService::new(store.clone())),
      orders: Arc::new(OrderService::new(store, policy)),
      tokens: Arc::new(TokenIssuer::new(config.jwt_secret.as_bytes(), config.jwt_expiration_secs)),
      config,
    }
  }

  /// Startup data: the demo catalog when `SEED_DB` is set, and the admin account when
  /// its credentials are configured.
  pub async fn seed(&self) -> Result<()> {
    if self.config.seed_db {
      let created = seed_catalog(&self.catalog).await?;
      info!(products = created, "Database seeding finished.");
    }
    if let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password) {
      if ensure_admin(&self.accounts, email, password).await? {
        info!(admin = %email, "Seed admin account created.");
      }
    }
    Ok(())
  }
}
