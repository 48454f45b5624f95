// server/src/web/routes.rs

use actix_web::{web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, category_handlers, order_handlers, product_handlers, user_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Extractor failures answer with the same `{"error": ...}` body as every other error.
fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

fn path_error(err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .app_data(web::QueryConfig::default().error_handler(query_error));

  cfg.service(
    web::scope("/api")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Authentication Routes
      .service(
        web::scope("/auth")
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/login", web::post().to(auth_handlers::login_handler)),
      )
      // Catalog: reads are public, writes need ADMIN
      .service(
        web::scope("/products")
          .service(
            web::resource("")
              .route(web::get().to(product_handlers::list_products_handler))
              .route(web::post().to(product_handlers::create_product_handler)),
          )
          // Literal segments before `/{product_id}`
          .route("/search", web::get().to(product_handlers::search_products_handler))
          .route(
            "/category/{category_id}",
            web::get().to(product_handlers::products_by_category_handler),
          )
          .service(
            web::resource("/{product_id}")
              .route(web::get().to(product_handlers::get_product_handler))
              .route(web::put().to(product_handlers::update_product_handler))
              .route(web::delete().to(product_handlers::delete_product_handler)),
          ),
      )
      .service(
        web::scope("/categories")
          .service(
            web::resource("")
              .route(web::get().to(category_handlers::list_categories_handler))
              .route(web::post().to(category_handlers::create_category_handler)),
          )
          .service(
            web::resource("/{category_id}")
              .route(web::get().to(category_handlers::get_category_handler))
              .route(web::delete().to(category_handlers::delete_category_handler)),
          ),
      )
      // Orders
      .service(
        web::scope("/orders")
          .service(
            web::resource("")
              .route(web::get().to(order_handlers::list_orders_handler))
              .route(web::post().to(order_handlers::place_order_handler)),
          )
          .route("/my", web::get().to(order_handlers::my_orders_handler))
          .route("/user/{user_id}", web::get().to(order_handlers::orders_for_user_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route(
            "/{order_id}/status",
            web::put().to(order_handlers::update_order_status_handler),
          ),
      )
      // Admin account management
      .service(
        web::scope("/users")
          .service(
            web::resource("")
              .route(web::get().to(user_handlers::list_users_handler))
              .route(web::post().to(user_handlers::create_user_handler)),
          )
          .route("/email/{email}", web::get().to(user_handlers::get_user_by_email_handler))
          .service(
            web::resource("/{user_id}")
              .route(web::get().to(user_handlers::get_user_handler))
              .route(web::delete().to(user_handlers::delete_user_handler)),
          ),
      ),
  );
}
