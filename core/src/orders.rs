// core/src/orders.rs

//! Order reads, placement entry point and status transitions.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;
use crate::model::{Order, OrderId, OrderStatus, OrderSummary, UserId};
use crate::placement::{OrderPlacement, PlaceOrderRequest};
use crate::store::Storefront;

/// How status updates are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
  /// Any status may be set to any other status.
  #[default]
  Permissive,
  /// Only moves allowed by [`OrderStatus::successors`] (or a repeat of the current status).
  Strict,
}

impl StatusPolicy {
  pub fn check(&self, from: OrderStatus, to: OrderStatus) -> StoreResult<()> {
    match self {
      StatusPolicy::Permissive => Ok(()),
      StatusPolicy::Strict if from.can_transition_to(to) => Ok(()),
      StatusPolicy::Strict => Err(StoreError::InvalidTransition { from, to }),
    }
  }
}

pub struct OrderService {
  store: Arc<dyn Storefront>,
  placement: OrderPlacement,
  policy: StatusPolicy,
}

impl OrderService {
  pub fn new<S: Storefront + 'static>(store: Arc<S>, policy: StatusPolicy) -> Self {
    Self {
      placement: OrderPlacement::new(store.clone()),
      store,
      policy,
    }
  }

  pub fn policy(&self) -> StatusPolicy {
    self.policy
  }

  pub async fn place_order(&self, customer: &Identity, request: &PlaceOrderRequest) -> StoreResult<OrderSummary> {
    self.placement.place(customer, request).await
  }

  pub async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
    self.store.list_orders(status).await
  }

  #[instrument(name = "orders::get_order", skip(self), err(Display))]
  pub async fn get_order(&self, id: OrderId) -> StoreResult<OrderSummary> {
    let order = self
      .store
      .find_order(id)
      .await?
      .ok_or_else(|| StoreError::not_found("Order", id))?;
    let lines = self.store.order_lines(order.id).await?;
    Ok(OrderSummary::new(order, lines))
  }

  /// Orders owned by `user_id`. `NotFound` when the user does not exist.
  pub async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderSummary>> {
    if self.store.find_user(user_id).await?.is_none() {
      return Err(StoreError::not_found("User", user_id));
    }
    self.summaries(self.store.orders_for_user(user_id).await?).await
  }

  pub async fn orders_of(&self, customer: &Identity) -> StoreResult<Vec<OrderSummary>> {
    self.summaries(self.store.orders_for_user(customer.user_id).await?).await
  }

  /// Sets an order's status. Stock is never touched, not even on cancellation.
  #[instrument(name = "orders::update_status", skip(self), fields(policy = ?self.policy), err(Display))]
  pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
    let current = self
      .store
      .find_order(id)
      .await?
      .ok_or_else(|| StoreError::not_found("Order", id))?;

    if let Err(err) = self.policy.check(current.status, status) {
      warn!(order_id = id, from = %current.status, to = %status, "Status change refused.");
      return Err(err);
    }

    // The order may have been removed between the two calls.
    let updated = self
      .store
      .update_order_status(id, status)
      .await?
      .ok_or_else(|| StoreError::not_found("Order", id))?;
    info!(order_id = id, from = %current.status, to = %updated.status, "Order status updated.");
    Ok(updated)
  }

  async fn summaries(&self, orders: Vec<Order>) -> StoreResult<Vec<OrderSummary>> {
    let mut summaries = Vec::with_capacity(orders.len());
    for order in orders {
      let lines = self.store.order_lines(order.id).await?;
      summaries.push(OrderSummary::new(order, lines));
    }
    Ok(summaries)
  }
}
