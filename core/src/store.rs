// core/src/store.rs

//! Persistence seams of the storefront.
//!
//! Services only see these traits. The server provides a PostgreSQL implementation and
//! this crate ships [`crate::memory::InMemoryStore`] for tests and local runs.
//!
//! Plain reads and single-row writes go through [`CatalogStore`], [`AccountStore`] and
//! [`OrderStore`]. Anything that must commit or roll back as a whole (order placement)
//! goes through a [`UnitOfWork`] obtained from [`TransactionalStore::begin`].

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{
  Category, CategoryId, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderId, OrderItem,
  OrderLine, OrderStatus, Product, ProductId, User, UserId,
};

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list_products(&self) -> StoreResult<Vec<Product>>;

  async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

  async fn products_in_category(&self, category_id: CategoryId) -> StoreResult<Vec<Product>>;

  /// Case-insensitive substring match on the product name.
  async fn search_products(&self, fragment: &str) -> StoreResult<Vec<Product>>;

  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product>;

  /// Replaces every editable field. `None` when the product does not exist.
  async fn update_product(&self, id: ProductId, changes: NewProduct) -> StoreResult<Option<Product>>;

  /// Returns whether a row was removed. Fails with `Conflict` when order lines still
  /// reference the product; the check and the removal are one atomic step.
  async fn delete_product(&self, id: ProductId) -> StoreResult<bool>;

  async fn list_categories(&self) -> StoreResult<Vec<Category>>;

  async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

  async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>>;

  /// Fails with `DuplicateCategory` if the name is taken.
  async fn insert_category(&self, category: NewCategory) -> StoreResult<Category>;

  /// Products of a removed category become uncategorized.
  async fn delete_category(&self, id: CategoryId) -> StoreResult<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
  async fn list_users(&self) -> StoreResult<Vec<User>>;

  async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

  async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

  async fn email_exists(&self, email: &str) -> StoreResult<bool>;

  /// Fails with `DuplicateEmail` if the email is taken.
  async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

  /// Fails with `Conflict` when the user owns orders, checked atomically with the removal.
  async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>>;

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;

  /// Lines of an order with the product name attached, in insertion order.
  async fn order_lines(&self, order_id: OrderId) -> StoreResult<Vec<OrderLine>>;

  /// Overwrites the status. `None` when the order does not exist.
  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Option<Order>>;
}

#[async_trait]
pub trait TransactionalStore: Send + Sync {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// One all-or-nothing unit of persistence.
///
/// Writes made through a unit of work are invisible to other readers until
/// [`UnitOfWork::commit`]. Dropping a unit of work without committing discards them.
#[async_trait]
pub trait UnitOfWork: Send {
  /// Reads a product and holds it against concurrent writers until the unit ends.
  async fn lock_product(&mut self, id: ProductId) -> StoreResult<Option<Product>>;

  async fn write_stock(&mut self, id: ProductId, stock: i32) -> StoreResult<()>;

  async fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order>;

  async fn insert_order_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;

  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Everything a storefront backend has to provide.
pub trait Storefront: CatalogStore + AccountStore + OrderStore + TransactionalStore {}

impl<T> Storefront for T where T: CatalogStore + AccountStore + OrderStore + TransactionalStore {}
