// core/src/placement.rs

//! Order placement: turns a list of `(product, quantity)` requests into a persisted order.
//!
//! A placement runs in one [`UnitOfWork`]:
//!
//! 1. lock every product the request names, in ascending id order;
//! 2. for each line, in the order submitted: resolve the product, check stock,
//!    write the decremented stock and snapshot the price;
//! 3. insert the order (`PENDING`, dated now, owned by the caller, total = Σ subtotals);
//! 4. insert the line items against the new order id;
//! 5. commit.
//!
//! Any failure before the commit rolls the unit back, so a rejected placement leaves no
//! stock change, order or line item behind.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;
use crate::model::{money, NewOrder, NewOrderItem, OrderLine, OrderStatus, OrderSummary, Product, ProductId};
use crate::store::{TransactionalStore, UnitOfWork};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
  pub product_id: ProductId,
  pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
  pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
  pub fn new(items: impl IntoIterator<Item = (ProductId, i32)>) -> Self {
    Self {
      items: items
        .into_iter()
        .map(|(product_id, quantity)| OrderLineRequest { product_id, quantity })
        .collect(),
    }
  }

  pub fn validate(&self) -> StoreResult<()> {
    if self.items.is_empty() {
      return Err(StoreError::Validation("An order needs at least one item.".to_string()));
    }
    if let Some(line) = self.items.iter().find(|line| line.quantity <= 0) {
      return Err(StoreError::Validation(format!(
        "Quantity for product {} must be positive, got {}.",
        line.product_id, line.quantity
      )));
    }
    Ok(())
  }
}

/// A line that passed the stock check, before the order row exists.
struct PricedLine {
  product_id: ProductId,
  product_name: String,
  quantity: i32,
  unit_price: Decimal,
}

pub struct OrderPlacement {
  store: Arc<dyn TransactionalStore>,
}

impl OrderPlacement {
  pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
    Self { store }
  }

  /// Places an order on behalf of `customer`.
  ///
  /// # Errors
  /// * `Validation` for an empty request or a non-positive quantity.
  /// * `NotFound` when a product id does not exist.
  /// * `InsufficientStock` when a line asks for more than is left.
  /// * `Validation` when the order total would exceed [`money::MAX_TOTAL`].
  /// * `Persistence` when the store fails, including on commit.
  #[instrument(
    name = "placement::place",
    skip(self, customer, request),
    fields(user_id = customer.user_id, lines = request.items.len()),
    err(Display)
  )]
  pub async fn place(&self, customer: &Identity, request: &PlaceOrderRequest) -> StoreResult<OrderSummary> {
    request.validate()?;

    let mut uow = self.store.begin().await?;
    let outcome = Self::place_within(uow.as_mut(), customer, request).await;
    match outcome {
      Ok(summary) => {
        uow.commit().await?;
        info!(
          order_id = summary.id,
          total = %summary.total_amount,
          "Order placed."
        );
        Ok(summary)
      }
      Err(err) => {
        if let Err(rollback_err) = uow.rollback().await {
          warn!(error = %rollback_err, "Rollback after a rejected placement failed.");
        }
        warn!(error = %err, "Order placement rejected; nothing was persisted.");
        Err(err)
      }
    }
  }

  async fn place_within(
    uow: &mut dyn UnitOfWork,
    customer: &Identity,
    request: &PlaceOrderRequest,
  ) -> StoreResult<OrderSummary> {
    let mut locked = Self::lock_products(uow, request).await?;

    let mut lines = Vec::with_capacity(request.items.len());
    let mut total = money::zero();
    for requested in &request.items {
      let product = locked
        .get_mut(&requested.product_id)
        .and_then(Option::as_mut)
        .ok_or_else(|| StoreError::not_found("Product", requested.product_id))?;

      let line = Self::reserve(uow, product, requested.quantity).await?;
      total = money::add_line(total, line.unit_price, line.quantity)?;
      lines.push(line);
    }

    let order = uow
      .insert_order(NewOrder {
        user_id: customer.user_id,
        order_date: Utc::now(),
        status: OrderStatus::Pending,
        total_amount: total,
      })
      .await?;

    let mut summary_lines = Vec::with_capacity(lines.len());
    for line in lines {
      uow
        .insert_order_item(NewOrderItem {
          order_id: order.id,
          product_id: line.product_id,
          quantity: line.quantity,
          unit_price: line.unit_price,
        })
        .await?;
      summary_lines.push(OrderLine::new(line.product_id, line.product_name, line.quantity, line.unit_price));
    }

    Ok(OrderSummary::new(order, summary_lines))
  }

  // Locks are taken in ascending id order so two placements naming the same products
  // never wait on each other in a cycle. Unknown ids are remembered as `None` and only
  // reported when their line comes up, keeping errors in submission order.
  async fn lock_products(
    uow: &mut dyn UnitOfWork,
    request: &PlaceOrderRequest,
  ) -> StoreResult<BTreeMap<ProductId, Option<Product>>> {
    let mut locked = BTreeMap::new();
    for line in &request.items {
      locked.entry(line.product_id).or_insert(None);
    }
    for (id, slot) in locked.iter_mut() {
      *slot = uow.lock_product(*id).await?;
    }
    Ok(locked)
  }

  async fn reserve(uow: &mut dyn UnitOfWork, product: &mut Product, quantity: i32) -> StoreResult<PricedLine> {
    if product.stock < quantity {
      return Err(StoreError::InsufficientStock {
        product_name: product.name.clone(),
        available: product.stock,
        requested: quantity,
      });
    }

    product.stock -= quantity;
    uow.write_stock(product.id, product.stock).await?;
    debug!(
      product_id = product.id,
      quantity,
      remaining = product.stock,
      "Stock reserved."
    );

    Ok(PricedLine {
      product_id: product.id,
      product_name: product.name.clone(),
      quantity,
      unit_price: product.price,
    })
  }
}
