// server/src/postgres.rs

//! PostgreSQL implementation of the storefront store traits.
//!
//! Queries are runtime-checked (`query` / `query_as`), so the crate builds without a
//! live database. A [`PgUnitOfWork`] wraps one `sqlx::Transaction`; products it reads
//! through `lock_product` are held with `SELECT ... FOR UPDATE` until it commits or
//! rolls back. Dropping it without a commit rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use storefront::model::{
  Category, CategoryId, NewCategory, NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderId, OrderItem,
  OrderLine, OrderStatus, Product, ProductId, Role, User, UserId,
};
use storefront::{AccountStore, CatalogStore, OrderStore, StoreError, StoreResult, TransactionalStore, UnitOfWork};
use tracing::{debug, info, instrument};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category_id";
const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, phone, address, created_at";
const ORDER_COLUMNS: &str = "id, user_id, order_date, status, total_amount";

// --- Row types ---

#[derive(Debug, FromRow)]
struct ProductRow {
  id: i64,
  name: String,
  description: Option<String>,
  price: Decimal,
  stock: i32,
  category_id: Option<i64>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      description: row.description,
      price: row.price,
      stock: row.stock,
      category_id: row.category_id,
    }
  }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
  id: i64,
  name: String,
  description: Option<String>,
}

impl From<CategoryRow> for Category {
  fn from(row: CategoryRow) -> Self {
    Category {
      id: row.id,
      name: row.name,
      description: row.description,
    }
  }
}

#[derive(Debug, FromRow)]
struct UserRow {
  id: i64,
  first_name: String,
  last_name: String,
  email: String,
  password_hash: String,
  role: String,
  phone: Option<String>,
  address: Option<String>,
  created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
  type Error = StoreError;

  fn try_from(row: UserRow) -> StoreResult<Self> {
    Ok(User {
      id: row.id,
      first_name: row.first_name,
      last_name: row.last_name,
      email: row.email,
      password_hash: row.password_hash,
      role: row.role.parse::<Role>().map_err(|_| corrupt_column("users.role", &row.role))?,
      phone: row.phone,
      address: row.address,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: i64,
  user_id: i64,
  order_date: DateTime<Utc>,
  status: String,
  total_amount: Decimal,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> StoreResult<Self> {
    Ok(Order {
      id: row.id,
      user_id: row.user_id,
      order_date: row.order_date,
      status: row
        .status
        .parse::<OrderStatus>()
        .map_err(|_| corrupt_column("orders.status", &row.status))?,
      total_amount: row.total_amount,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: i64,
  order_id: i64,
  product_id: i64,
  quantity: i32,
  unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product_id: row.product_id,
      quantity: row.quantity,
      unit_price: row.unit_price,
    }
  }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
  product_id: i64,
  product_name: String,
  quantity: i32,
  unit_price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
  fn from(row: OrderLineRow) -> Self {
    OrderLine::new(row.product_id, row.product_name, row.quantity, row.unit_price)
  }
}

// --- Error mapping ---

fn db_error(err: sqlx::Error) -> StoreError {
  StoreError::from(anyhow::Error::new(err))
}

fn corrupt_column(column: &str, value: &str) -> StoreError {
  StoreError::Internal(format!("Unexpected value '{}' in {}", value, column))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Escapes LIKE metacharacters so a search fragment matches literally.
fn like_pattern(fragment: &str) -> String {
  let escaped = fragment
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{}%", escaped)
}

fn collect_orders(rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
  rows.into_iter().map(Order::try_from).collect()
}

// --- Store ---

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!(max_connections, "Connected to PostgreSQL.");
    Ok(Self { pool })
  }

  /// Applies the migrations in `server/migrations`.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  async fn fetch_products(&self, sql: &str, bind: Option<i64>) -> StoreResult<Vec<Product>> {
    let mut query = sqlx::query_as::<_, ProductRow>(sql);
    if let Some(value) = bind {
      query = query.bind(value);
    }
    let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    self
      .fetch_products(&format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS), None)
      .await
  }

  async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(row.map(Product::from))
  }

  async fn products_in_category(&self, category_id: CategoryId) -> StoreResult<Vec<Product>> {
    self
      .fetch_products(
        &format!(
          "SELECT {} FROM products WHERE category_id = $1 ORDER BY id",
          PRODUCT_COLUMNS
        ),
        Some(category_id),
      )
      .await
  }

  async fn search_products(&self, fragment: &str) -> StoreResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
      "SELECT {} FROM products WHERE name ILIKE $1 ORDER BY id",
      PRODUCT_COLUMNS
    ))
    .bind(like_pattern(fragment))
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  #[instrument(name = "pg::insert_product", skip(self, product), err(Display))]
  async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
      "INSERT INTO products (name, description, price, stock, category_id) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.category_id)
    .fetch_one(&self.pool)
    .await
    .map_err(db_error)?;
    Ok(row.into())
  }

  #[instrument(name = "pg::update_product", skip(self, changes), err(Display))]
  async fn update_product(&self, id: ProductId, changes: NewProduct) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
      "UPDATE products SET name = $2, description = $3, price = $4, stock = $5, category_id = $6 \
       WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.price)
    .bind(changes.stock)
    .bind(changes.category_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error)?;
    Ok(row.map(Product::from))
  }

  async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await;
    match result {
      Ok(done) => Ok(done.rows_affected() > 0),
      // order_items.product_id has no ON DELETE action.
      Err(e) if is_foreign_key_violation(&e) => Err(StoreError::Conflict(format!(
        "Product {} is referenced by existing orders and cannot be deleted.",
        id
      ))),
      Err(e) => Err(db_error(e)),
    }
  }

  async fn list_categories(&self) -> StoreResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name, description FROM categories ORDER BY id")
      .fetch_all(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(rows.into_iter().map(Category::from).collect())
  }

  async fn find_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
    let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name, description FROM categories WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(row.map(Category::from))
  }

  async fn find_category_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
    let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name, description FROM categories WHERE name = $1")
      .bind(name)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(row.map(Category::from))
  }

  #[instrument(name = "pg::insert_category", skip(self, category), fields(name = %category.name), err(Display))]
  async fn insert_category(&self, category: NewCategory) -> StoreResult<Category> {
    let result = sqlx::query_as::<_, CategoryRow>(
      "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description",
    )
    .bind(&category.name)
    .bind(&category.description)
    .fetch_one(&self.pool)
    .await;
    match result {
      Ok(row) => Ok(row.into()),
      Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateCategory(category.name)),
      Err(e) => Err(db_error(e)),
    }
  }

  // `products.category_id` is ON DELETE SET NULL.
  async fn delete_category(&self, id: CategoryId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
  }
}

#[async_trait]
impl AccountStore for PgStore {
  async fn list_users(&self) -> StoreResult<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(db_error)?;
    rows.into_iter().map(User::try_from).collect()
  }

  async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    row.map(User::try_from).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
      .bind(email)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    row.map(User::try_from).transpose()
  }

  async fn email_exists(&self, email: &str) -> StoreResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
      .bind(email)
      .fetch_one(&self.pool)
      .await
      .map_err(db_error)
  }

  #[instrument(name = "pg::insert_user", skip(self, user), fields(role = %user.role), err(Display))]
  async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
    let result = sqlx::query_as::<_, UserRow>(&format!(
      "INSERT INTO users (first_name, last_name, email, password_hash, role, phone, address) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(&user.phone)
    .bind(&user.address)
    .fetch_one(&self.pool)
    .await;
    match result {
      Ok(row) => User::try_from(row),
      // Two registrations racing past the service-level check.
      Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateEmail(user.email)),
      Err(e) => Err(db_error(e)),
    }
  }

  async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await;
    match result {
      Ok(done) => Ok(done.rows_affected() > 0),
      Err(e) if is_foreign_key_violation(&e) => Err(StoreError::Conflict(format!(
        "User {} owns orders and cannot be deleted.",
        id
      ))),
      Err(e) => Err(db_error(e)),
    }
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {} FROM orders WHERE ($1::TEXT IS NULL OR status = $1::TEXT) ORDER BY id",
      ORDER_COLUMNS
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    collect_orders(rows)
  }

  async fn find_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_error)?;
    row.map(Order::try_from).transpose()
  }

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY id",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    collect_orders(rows)
  }

  async fn order_lines(&self, order_id: OrderId) -> StoreResult<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
      "SELECT oi.product_id, COALESCE(p.name, 'Product ' || oi.product_id) AS product_name, \
              oi.quantity, oi.unit_price \
       FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
       WHERE oi.order_id = $1 ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_error)?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
  }

  #[instrument(name = "pg::update_order_status", skip(self), err(Display))]
  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(&self.pool)
    .await
    .map_err(db_error)?;
    row.map(Order::try_from).transpose()
  }
}

#[async_trait]
impl TransactionalStore for PgStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let tx = self.pool.begin().await.map_err(db_error)?;
    debug!("Transaction started.");
    Ok(Box::new(PgUnitOfWork { tx }))
  }
}

// --- Unit of work ---

pub struct PgUnitOfWork {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
  async fn lock_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
      "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(db_error)?;
    Ok(row.map(Product::from))
  }

  async fn write_stock(&mut self, id: ProductId, stock: i32) -> StoreResult<()> {
    let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
      .bind(id)
      .bind(stock)
      .execute(&mut *self.tx)
      .await
      .map_err(db_error)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::not_found("Product", id));
    }
    Ok(())
  }

  async fn insert_order(&mut self, order: NewOrder) -> StoreResult<Order> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "INSERT INTO orders (user_id, order_date, status, total_amount) VALUES ($1, $2, $3, $4) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order.user_id)
    .bind(order.order_date)
    .bind(order.status.as_str())
    .bind(order.total_amount)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(db_error)?;
    Order::try_from(row)
  }

  async fn insert_order_item(&mut self, item: NewOrderItem) -> StoreResult<OrderItem> {
    let row = sqlx::query_as::<_, OrderItemRow>(
      "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4) \
       RETURNING id, order_id, product_id, quantity, unit_price",
    )
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(db_error)?;
    Ok(row.into())
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let this = *self;
    this.tx.commit().await.map_err(db_error)?;
    debug!("Transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    let this = *self;
    this.tx.rollback().await.map_err(db_error)?;
    debug!("Transaction rolled back.");
    Ok(())
  }
}
