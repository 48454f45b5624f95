// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use storefront::model::{OrderId, OrderStatus, UserId};
use storefront::PlaceOrderRequest;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct StatusFilterQuery {
  pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdatePayload {
  pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
  raw
    .parse::<OrderStatus>()
    .map_err(|_| AppError::Validation(format!("Unknown order status '{}'", raw)))
}

#[instrument(
    name = "handler::place_order",
    skip(app_state, auth_user, req_payload),
    fields(user_id = auth_user.user_id, lines = req_payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let summary = app_state
    .orders
    .place_order(&auth_user, &req_payload)
    .await
    .map_err(AppError::OrderRejected)?;

  info!(order_id = summary.id, total = %summary.total_amount, "Order placed via API.");
  Ok(HttpResponse::Ok().json(summary))
}

pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.orders_of(&auth_user).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
  let summary = app_state.orders.get_order(path.into_inner()).await?;
  if let Err(e) = auth_user.require_self_or_admin(summary.user_id) {
    warn!(caller = auth_user.user_id, owner = summary.user_id, "Order read refused.");
    return Err(e.into());
  }
  Ok(HttpResponse::Ok().json(summary))
}

pub async fn orders_for_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<UserId>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.require_self_or_admin(user_id)?;
  let orders = app_state.orders.orders_for_user(user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<StatusFilterQuery>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let status = query.status.as_deref().map(parse_status).transpose()?;
  let orders = app_state.orders.list_orders(status).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
    name = "handler::update_order_status",
    skip(app_state, auth_user, path, req_payload),
    fields(admin = %auth_user.email, order_id = %path.as_ref(), status = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<OrderId>,
  req_payload: web::Json<StatusUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let status = parse_status(&req_payload.status)?;
  let order = app_state.orders.update_status(path.into_inner(), status).await?;
  Ok(HttpResponse::Ok().json(order))
}
