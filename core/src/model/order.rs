// core/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money;
use super::{ProductId, UserId};
use crate::error::StoreError;

pub type OrderId = i64;

/// Lifecycle of an order.
///
/// The intended flow is `Pending → Confirmed → Shipped → Delivered`, with `Cancelled`
/// reachable from any non-terminal state. Whether that flow is enforced is decided by
/// [`crate::orders::StatusPolicy`], not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Confirmed => "CONFIRMED",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }

  /// States reachable in one step under the strict transition table.
  pub fn successors(&self) -> &'static [OrderStatus] {
    match self {
      OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
      OrderStatus::Confirmed => &[OrderStatus::Shipped, OrderStatus::Cancelled],
      OrderStatus::Shipped => &[OrderStatus::Delivered],
      OrderStatus::Delivered | OrderStatus::Cancelled => &[],
    }
  }

  pub fn can_transition_to(&self, next: OrderStatus) -> bool {
    *self == next || self.successors().contains(&next)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_ascii_uppercase();
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == wanted)
      .ok_or_else(|| StoreError::Validation(format!("Unknown order status: {}", s)))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: OrderId,
  pub user_id: UserId,
  pub order_date: DateTime<Utc>,
  pub status: OrderStatus,
  /// Sum of the line subtotals at creation. Never recomputed.
  pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: UserId,
  pub order_date: DateTime<Utc>,
  pub status: OrderStatus,
  pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: i64,
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: i32,
  /// Product price when the order was placed.
  pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: i32,
  pub unit_price: Decimal,
}

/// One priced line of an order as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: ProductId,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub subtotal: Decimal,
}

impl OrderLine {
  pub fn new(product_id: ProductId, product_name: impl Into<String>, quantity: i32, unit_price: Decimal) -> Self {
    Self {
      product_id,
      product_name: product_name.into(),
      quantity,
      unit_price,
      subtotal: money::line_subtotal(unit_price, quantity),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub id: OrderId,
  pub user_id: UserId,
  pub order_date: DateTime<Utc>,
  pub status: OrderStatus,
  pub total_amount: Decimal,
  pub items: Vec<OrderLine>,
}

impl OrderSummary {
  pub fn new(order: Order, items: Vec<OrderLine>) -> Self {
    Self {
      id: order.id,
      user_id: order.user_id,
      order_date: order.order_date,
      status: order.status,
      total_amount: order.total_amount,
      items,
    }
  }
}
