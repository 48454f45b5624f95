// server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use storefront::model::{CategoryId, NewProduct, ProductId};
use tracing::{info, instrument};
use validator::Validate;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
  #[validate(length(min = 1, max = 200, message = "Product name must be 1 to 200 characters"))]
  pub name: String,
  #[serde(default)]
  #[validate(length(max = 2000))]
  pub description: Option<String>,
  pub price: Decimal,
  #[validate(range(min = 0, message = "Stock cannot be negative"))]
  pub stock: i32,
  #[serde(default)]
  pub category_id: Option<CategoryId>,
}

impl From<ProductPayload> for NewProduct {
  fn from(payload: ProductPayload) -> Self {
    NewProduct {
      name: payload.name,
      description: payload.description,
      price: payload.price,
      stock: payload.stock,
      category_id: payload.category_id,
    }
  }
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  pub name: Option<String>,
}

pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.list_products().await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<ProductId>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

pub async fn products_by_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<CategoryId>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.products_in_category(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(products))
}

pub async fn search_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let name = query
    .into_inner()
    .name
    .ok_or_else(|| AppError::Validation("Query parameter 'name' is required".to_string()))?;
  let products = app_state.catalog.search_products(&name).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(
    name = "handler::create_product",
    skip(app_state, auth_user, req_payload),
    fields(admin = %auth_user.email)
)]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let product = app_state.catalog.create_product(payload.into()).await?;
  info!(product_id = product.id, "Product created via API.");
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(
    name = "handler::update_product",
    skip(app_state, auth_user, path, req_payload),
    fields(admin = %auth_user.email, product_id = %path.as_ref())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<ProductId>,
  req_payload: web::Json<ProductPayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let product = app_state.catalog.update_product(path.into_inner(), payload.into()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(
    name = "handler::delete_product",
    skip(app_state, auth_user, path),
    fields(admin = %auth_user.email, product_id = %path.as_ref())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<ProductId>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  app_state.catalog.delete_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Product deleted."})))
}
