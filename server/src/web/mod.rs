// server/src/web/mod.rs

// Declare child modules
pub mod extractors;
pub mod handlers;
pub mod routes;

// Re-export so main.rs and the integration tests wire the app the same way.
pub use routes::configure_app_routes;
