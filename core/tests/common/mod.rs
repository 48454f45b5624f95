// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use storefront::model::{NewOrder, NewOrderItem, NewProduct, Order, OrderItem, Product, ProductId, Role};
use storefront::{
  AccountService, CatalogService, Identity, InMemoryStore, OrderService, Registration, StatusPolicy, StoreError,
  StoreResult, TransactionalStore, UnitOfWork,
};
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

// --- Fixture wiring every service to one in-memory store ---
pub struct Fixture {
  pub store: Arc<InMemoryStore>,
  pub catalog: CatalogService,
  pub accounts: AccountService,
  pub orders: OrderService,
}

impl Fixture {
  pub fn new() -> Self {
    Self::with_policy(StatusPolicy::Permissive)
  }

  pub fn with_policy(policy: StatusPolicy) -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryStore::new());
    Self {
      catalog: CatalogService::new(store.clone()),
      accounts: AccountService::new(store.clone()),
      orders: OrderService::new(store.clone(), policy),
      store,
    }
  }

  pub async fn product(&self, name: &str, price: Decimal, stock: i32) -> Product {
    self
      .catalog
      .create_product(NewProduct {
        name: name.to_string(),
        description: None,
        price,
        stock,
        category_id: None,
      })
      .await
      .expect("product fixture")
  }

  pub async fn stock_of(&self, id: ProductId) -> i32 {
    self.catalog.get_product(id).await.expect("product exists").stock
  }

  pub async fn customer(&self, email: &str) -> Identity {
    let user = self
      .accounts
      .register(registration(email, "password1"))
      .await
      .expect("customer fixture");
    Identity::from(&user)
  }

  pub async fn admin(&self, email: &str) -> Identity {
    let user = self
      .accounts
      .create_user(registration(email, "password1"), Role::Admin)
      .await
      .expect("admin fixture");
    Identity::from(&user)
  }

  pub async fn order_count(&self) -> usize {
    self.orders.list_orders(None).await.expect("list orders").len()
  }
}

pub fn registration(email: &str, password: &str) -> Registration {
  Registration {
    first_name: "Grace".to_string(),
    last_name: "Hopper".to_string(),
    email: email.to_string(),
    password: password.to_string(),
    phone: Some("+1 555 0100".to_string()),
    address: Some("1 Navy Yard".to_string()),
  }
}

// --- Store whose units of work fail at a chosen step ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
  InsertOrder,
  InsertItem,
  Commit,
}

pub struct FailingStore {
  pub inner: Arc<InMemoryStore>,
  pub fail_at: FailAt,
}

#[async_trait]
impl TransactionalStore for FailingStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    Ok(Box::new(FailingUnitOfWork {
      inner: self.inner.begin().await?,
      fail_at: self.fail_at,
    }))
  }
}

struct FailingUnitOfWork {
  inner: Box<dyn UnitOfWork>,
  fail_at: FailAt,
}

fn injected() -> StoreError {
  StoreError::from(anyhow::anyhow!("injected store failure"))
}

#[async_trait]
impl UnitOfWork for FailingUnitOfWork {
  async fn lock_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
    self.inner.lock_product(id).await
  }

  async fn write_stock(&mut self, id: ProductId, stock: i32) -> StoreResult<()> {
    self.inner.write_stock(id, stock).await
  }

  async fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order> {
    if self.fail_at == FailAt::InsertOrder {
      return Err(injected());
    }
    self.inner.insert_order(order).await
  }

  async fn insert_order_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem> {
    if self.fail_at == FailAt::InsertItem {
      return Err(injected());
    }
    self.inner.insert_order_item(item).await
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    if self.fail_at == FailAt::Commit {
      // Dropping the inner unit discards its staged writes.
      return Err(injected());
    }
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.inner.rollback().await
  }
}
