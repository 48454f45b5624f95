// server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer}; // Renamed web to actix_data
use std::sync::Arc;
use storefront::InMemoryStore;
use storefront_server::config::{AppConfig, LogFormat, StoreBackend};
use storefront_server::errors::AppError;
use storefront_server::postgres::PgStore;
use storefront_server::state::AppState;
use storefront_server::telemetry::init_tracing;
use storefront_server::web::configure_app_routes;

async fn build_state(config: Arc<AppConfig>) -> Result<AppState, AppError> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let store = PgStore::connect(database_url, config.database_max_connections).await?;
      store.migrate().await?;
      Ok(AppState::new(Arc::new(store), config))
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on shutdown.");
      Ok(AppState::new(Arc::new(InMemoryStore::new()), config))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing(LogFormat::from_env());

  tracing::info!("Starting storefront server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg), // Arc the config for sharing
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e));
    }
  };

  let app_state = match build_state(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise the store.");
      return Err(std::io::Error::other(e));
    }
  };

  if let Err(e) = app_state.seed().await {
    tracing::error!(error = %e, "Failed to seed startup data.");
    return Err(std::io::Error::other(e));
  }

  // Configure and Start Actix Web Server
  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
