// core/src/memory.rs

//! A process-local [`Storefront`](crate::store::Storefront) implementation.
//!
//! State lives behind a `parking_lot::RwLock`. Every mutation, including a whole
//! [`UnitOfWork`], first takes the async write gate, so writers are serialized the way
//! row locks serialize them in a database. A unit of work stages its changes and only
//! touches the shared state on commit.
//!
//! IMPORTANT: the `RwLock` guards are blocking and are never held across `.await`.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

use crate::error::{StoreError, StoreResult};
use crate::model::{
  Category, CategoryId, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderId, OrderItem,
  OrderLine, OrderStatus, Product, ProductId, User, UserId,
};
use crate::store::{AccountStore, CatalogStore, OrderStore, TransactionalStore, UnitOfWork};

#[derive(Debug, Default)]
struct StoreState {
  products: BTreeMap<ProductId, Product>,
  categories: BTreeMap<CategoryId, Category>,
  users: BTreeMap<UserId, User>,
  orders: BTreeMap<OrderId, Order>,
  order_items: BTreeMap<i64, OrderItem>,
}

impl StoreState {
  fn line_for(&self, item: &OrderItem) -> OrderLine {
    let name = self
      .products
      .get(&item.product_id)
      .map(|p| p.name.clone())
      .unwrap_or_else(|| format!("Product {}", item.product_id));
    OrderLine::new(item.product_id, name, item.quantity, item.unit_price)
  }
}

// Ids are handed out like database sequences: monotonically, and never reused even
// when the unit of work that took them rolls back.
#[derive(Debug, Default)]
struct Sequences {
  product: AtomicI64,
  category: AtomicI64,
  user: AtomicI64,
  order: AtomicI64,
  order_item: AtomicI64,
}

fn next_id(counter: &AtomicI64) -> i64 {
  counter.fetch_add(1, Ordering::SeqCst) + 1
}

#[derive(Debug, Default)]
struct Inner {
  state: RwLock<StoreState>,
  write_gate: Arc<Mutex<()>>,
  sequences: Sequences,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
  inner: Arc<Inner>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  async fn gate(&self) -> OwnedMutexGuard<()> {
    self.inner.write_gate.clone().lock_owned().await
  }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    Ok(self.inner.state.read().products.values().cloned().collect())
  }

  async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
    Ok(self.inner.state.read().products.get(&id).cloned())
  }

  async fn products_in_category(&self, category_id: CategoryId) -> StoreResult<Vec<Product>> {
    let state = self.inner.state.read();
    Ok(
      state
        .products
        .values()
        .filter(|p| p.category_id == Some(category_id))
        .cloned()
        .collect(),
    )
  }

  async fn search_products(&self, fragment: &str) -> StoreResult<Vec<Product>> {
    let needle = fragment.to_lowercase();
    let state = self.inner.state.read();
    Ok(
      state
        .products
        .values()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect(),
    )
  }

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
    let _gate = self.gate().await;
    let created = Product {
      id: next_id(&self.inner.sequences.product),
      name: product.name,
      description: product.description,
      price: product.price,
      stock: product.stock,
      category_id: product.category_id,
    };
    self.inner.state.write().products.insert(created.id, created.clone());
    Ok(created)
  }

  async fn update_product(&self, id: ProductId, changes: NewProduct) -> StoreResult<Option<Product>> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    Ok(state.products.get_mut(&id).map(|product| {
      product.name = changes.name;
      product.description = changes.description;
      product.price = changes.price;
      product.stock = changes.stock;
      product.category_id = changes.category_id;
      product.clone()
    }))
  }

  async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    if state.order_items.values().any(|item| item.product_id == id) {
      return Err(StoreError::Conflict(format!(
        "Product {} is referenced by existing orders and cannot be deleted.",
        id
      )));
    }
    Ok(state.products.remove(&id).is_some())
  }

  async fn list_categories(&self) -> StoreResult<Vec<Category>> {
    Ok(self.inner.state.read().categories.values().cloned().collect())
  }

  async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
    Ok(self.inner.state.read().categories.get(&id).cloned())
  }

  async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
    Ok(self.inner.state.read().categories.values().find(|c| c.name == name).cloned())
  }

  async fn insert_category(&self, category: NewCategory) -> StoreResult<Category> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    if state.categories.values().any(|c| c.name == category.name) {
      return Err(StoreError::DuplicateCategory(category.name));
    }
    let created = Category {
      id: next_id(&self.inner.sequences.category),
      name: category.name,
      description: category.description,
    };
    state.categories.insert(created.id, created.clone());
    Ok(created)
  }

  async fn delete_category(&self, id: CategoryId) -> StoreResult<bool> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    let removed = state.categories.remove(&id).is_some();
    if removed {
      for product in state.products.values_mut().filter(|p| p.category_id == Some(id)) {
        product.category_id = None;
      }
    }
    Ok(removed)
  }
}

#[async_trait]
impl AccountStore for InMemoryStore {
  async fn list_users(&self) -> StoreResult<Vec<User>> {
    Ok(self.inner.state.read().users.values().cloned().collect())
  }

  async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
    Ok(self.inner.state.read().users.get(&id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
    Ok(self.inner.state.read().users.values().find(|u| u.email == email).cloned())
  }

  async fn email_exists(&self, email: &str) -> StoreResult<bool> {
    Ok(self.inner.state.read().users.values().any(|u| u.email == email))
  }

  async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    if state.users.values().any(|u| u.email == user.email) {
      return Err(StoreError::DuplicateEmail(user.email));
    }
    let created = User {
      id: next_id(&self.inner.sequences.user),
      first_name: user.first_name,
      last_name: user.last_name,
      email: user.email,
      password_hash: user.password_hash,
      role: user.role,
      phone: user.phone,
      address: user.address,
      created_at: Utc::now(),
    };
    state.users.insert(created.id, created.clone());
    Ok(created)
  }

  async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    if state.orders.values().any(|order| order.user_id == id) {
      return Err(StoreError::Conflict(format!("User {} owns orders and cannot be deleted.", id)));
    }
    Ok(state.users.remove(&id).is_some())
  }
}

#[async_trait]
impl OrderStore for InMemoryStore {
  async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
    let state = self.inner.state.read();
    Ok(
      state
        .orders
        .values()
        .filter(|o| status.map_or(true, |s| o.status == s))
        .cloned()
        .collect(),
    )
  }

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
    Ok(self.inner.state.read().orders.get(&id).cloned())
  }

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
    let state = self.inner.state.read();
    Ok(state.orders.values().filter(|o| o.user_id == user_id).cloned().collect())
  }

  async fn order_lines(&self, order_id: OrderId) -> StoreResult<Vec<OrderLine>> {
    let state = self.inner.state.read();
    Ok(
      state
        .order_items
        .values()
        .filter(|item| item.order_id == order_id)
        .map(|item| state.line_for(item))
        .collect(),
    )
  }

  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Option<Order>> {
    let _gate = self.gate().await;
    let mut state = self.inner.state.write();
    Ok(state.orders.get_mut(&id).map(|order| {
      order.status = status;
      order.clone()
    }))
  }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
  #[instrument(name = "memory::begin", skip(self))]
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let gate = self.gate().await;
    debug!("In-memory unit of work started.");
    Ok(Box::new(MemoryUnitOfWork {
      inner: self.inner.clone(),
      _gate: gate,
      staged_stock: BTreeMap::new(),
      staged_orders: Vec::new(),
      staged_items: Vec::new(),
    }))
  }
}

/// Holds the write gate for its whole lifetime; staged changes die with it unless committed.
struct MemoryUnitOfWork {
  inner: Arc<Inner>,
  _gate: OwnedMutexGuard<()>,
  staged_stock: BTreeMap<ProductId, i32>,
  staged_orders: Vec<Order>,
  staged_items: Vec<OrderItem>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
  async fn lock_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
    let state = self.inner.state.read();
    Ok(state.products.get(&id).map(|product| {
      let mut product = product.clone();
      if let Some(stock) = self.staged_stock.get(&id) {
        product.stock = *stock;
      }
      product
    }))
  }

  async fn write_stock(&mut self, id: ProductId, stock: i32) -> StoreResult<()> {
    if !self.inner.state.read().products.contains_key(&id) {
      return Err(StoreError::not_found("Product", id));
    }
    self.staged_stock.insert(id, stock);
    Ok(())
  }

  async fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order> {
    let created = Order {
      id: next_id(&self.inner.sequences.order),
      user_id: order.user_id,
      order_date: order.order_date,
      status: order.status,
      total_amount: order.total_amount,
    };
    self.staged_orders.push(created.clone());
    Ok(created)
  }

  async fn insert_order_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem> {
    if !self.staged_orders.iter().any(|o| o.id == item.order_id) {
      return Err(StoreError::not_found("Order", item.order_id));
    }
    let created = OrderItem {
      id: next_id(&self.inner.sequences.order_item),
      order_id: item.order_id,
      product_id: item.product_id,
      quantity: item.quantity,
      unit_price: item.unit_price,
    };
    self.staged_items.push(created.clone());
    Ok(created)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let this = *self;
    let mut state = this.inner.state.write();
    for (id, stock) in this.staged_stock {
      if let Some(product) = state.products.get_mut(&id) {
        product.stock = stock;
      }
    }
    for order in this.staged_orders {
      state.orders.insert(order.id, order);
    }
    for item in this.staged_items {
      state.order_items.insert(item.id, item);
    }
    debug!("In-memory unit of work committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    debug!(
      staged_orders = self.staged_orders.len(),
      staged_items = self.staged_items.len(),
      "In-memory unit of work rolled back."
    );
    Ok(())
  }
}
