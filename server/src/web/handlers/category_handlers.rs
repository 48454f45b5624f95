// server/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::model::{CategoryId, NewCategory};
use tracing::instrument;
use validator::Validate;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug, Validate)]
pub struct CategoryPayload {
  #[validate(length(min = 1, max = 100, message = "Category name must be 1 to 100 characters"))]
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
}

pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = app_state.catalog.list_categories().await?;
  Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<CategoryId>,
) -> Result<HttpResponse, AppError> {
  let category = app_state.catalog.get_category(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(category))
}

#[instrument(
    name = "handler::create_category",
    skip(app_state, auth_user, req_payload),
    fields(admin = %auth_user.email, name = %req_payload.name)
)]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let category = app_state
    .catalog
    .create_category(NewCategory {
      name: payload.name,
      description: payload.description,
    })
    .await?;
  Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<CategoryId>,
) -> Result<HttpResponse, AppError> {
  auth_user.require_admin()?;
  app_state.catalog.delete_category(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({"message": "Category deleted."})))
}
