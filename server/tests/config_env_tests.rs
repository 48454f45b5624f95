// tests/config_env_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::env;
use storefront_server::{AppConfig, AppError, LogFormat, StoreBackend};

const VARS: [&str; 6] = [
  "STORE_BACKEND",
  "JWT_SECRET",
  "SERVER_PORT",
  "STRICT_STATUS_TRANSITIONS",
  "LOG_FORMAT",
  "DATABASE_URL",
];

fn clear_env() {
  for name in VARS {
    env::remove_var(name);
  }
}

#[test]
#[serial]
fn test_from_env_reads_the_process_environment() {
  setup_tracing();
  clear_env();
  env::set_var("STORE_BACKEND", "memory");
  env::set_var("JWT_SECRET", TEST_SECRET);
  env::set_var("SERVER_PORT", "9090");
  env::set_var("STRICT_STATUS_TRANSITIONS", "true");
  env::set_var("LOG_FORMAT", "json");

  let config = AppConfig::from_env().unwrap();
  assert_eq!(config.store_backend, StoreBackend::Memory);
  assert_eq!(config.server_port, 9090);
  assert!(config.strict_status_transitions);
  assert_eq!(config.log_format, LogFormat::Json);
  assert_eq!(LogFormat::from_env(), LogFormat::Json);

  clear_env();
}

#[test]
#[serial]
fn test_from_env_without_a_secret_is_a_config_error() {
  setup_tracing();
  clear_env();
  env::set_var("STORE_BACKEND", "memory");

  let result = AppConfig::from_env();
  assert!(matches!(result, Err(AppError::Config(_))));

  clear_env();
}
