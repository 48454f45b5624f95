// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use actix_web::http::header::{self, HeaderName};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use storefront::model::{NewProduct, Product, Role, User};
use storefront::{InMemoryStore, Registration};
use storefront_server::{AppConfig, AppState};
use tracing::Level;

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const PASSWORD: &str = "password123";

pub fn test_config(strict_status_transitions: bool) -> AppConfig {
  let vars: HashMap<&str, String> = HashMap::from([
    ("STORE_BACKEND", "memory".to_string()),
    ("JWT_SECRET", TEST_SECRET.to_string()),
    ("STRICT_STATUS_TRANSITIONS", strict_status_transitions.to_string()),
  ]);
  AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// Builds an actix test service over the given `AppState`.
macro_rules! spawn_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(storefront_server::web::configure_app_routes),
    )
    .await
  };
}

// --- Fixture: an AppState over a fresh in-memory store ---
pub struct TestApp {
  pub store: Arc<InMemoryStore>,
  pub state: AppState,
}

impl TestApp {
  pub fn new() -> Self {
    Self::with_strict_transitions(false)
  }

  pub fn with_strict_transitions(strict: bool) -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(store.clone(), Arc::new(test_config(strict)));
    Self { store, state }
  }

  pub async fn product(&self, name: &str, price: Decimal, stock: i32) -> Product {
    self
      .state
      .catalog
      .create_product(NewProduct {
        name: name.to_string(),
        description: None,
        price,
        stock,
        category_id: None,
      })
      .await
      .unwrap()
  }

  pub async fn stock_of(&self, product_id: i64) -> i32 {
    self.state.catalog.get_product(product_id).await.unwrap().stock
  }

  /// Creates an account directly and returns it with a valid bearer token.
  pub async fn account(&self, email: &str, role: Role) -> (User, String) {
    let user = self
      .state
      .accounts
      .create_user(
        Registration {
          first_name: "Test".to_string(),
          last_name: "Account".to_string(),
          email: email.to_string(),
          password: PASSWORD.to_string(),
          phone: None,
          address: None,
        },
        role,
      )
      .await
      .unwrap();
    let token = self.state.tokens.issue(&user.email).unwrap();
    (user, token)
  }

  pub async fn customer(&self, email: &str) -> (User, String) {
    self.account(email, Role::User).await
  }

  pub async fn admin(&self) -> (User, String) {
    self.account("admin@shop.io", Role::Admin).await
  }
}

pub fn bearer(token: &str) -> (HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}
