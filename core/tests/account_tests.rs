// tests/account_tests.rs
mod common;

use common::*;
use rust_decimal_macros::dec;
use storefront::model::Role;
use storefront::seed;
use storefront::{PlaceOrderRequest, StoreError};

#[tokio::test]
async fn test_register_then_login() {
  let fx = Fixture::new();
  let user = fx
    .accounts
    .register(registration("Grace@Example.com", "cobol1959"))
    .await
    .unwrap();
  assert_eq!(user.email, "grace@example.com");
  assert_eq!(user.role, Role::User);
  assert_ne!(user.password_hash, "cobol1959");

  let logged_in = fx.accounts.authenticate("grace@example.com", "cobol1959").await.unwrap();
  assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_keeps_original_credentials() {
  let fx = Fixture::new();
  fx.accounts
    .register(registration("grace@example.com", "original1"))
    .await
    .unwrap();

  let err = fx
    .accounts
    .register(registration("GRACE@example.com", "hijacked1"))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::DuplicateEmail(ref email) if email == "grace@example.com"));

  assert!(fx.accounts.authenticate("grace@example.com", "original1").await.is_ok());
  assert!(matches!(
    fx.accounts.authenticate("grace@example.com", "hijacked1").await,
    Err(StoreError::BadCredentials)
  ));
  assert_eq!(fx.accounts.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bad_credentials_do_not_reveal_which_part_failed() {
  let fx = Fixture::new();
  fx.customer("grace@example.com").await;

  let wrong_password = fx.accounts.authenticate("grace@example.com", "nope12345").await;
  let unknown_email = fx.accounts.authenticate("nobody@example.com", "password1").await;
  assert!(matches!(wrong_password, Err(StoreError::BadCredentials)));
  assert!(matches!(unknown_email, Err(StoreError::BadCredentials)));
}

#[tokio::test]
async fn test_identity_resolution_and_lookups() {
  let fx = Fixture::new();
  let admin = fx.admin("root@example.com").await;
  assert!(admin.is_admin());

  let resolved = fx.accounts.resolve_identity("ROOT@example.com").await.unwrap();
  assert_eq!(resolved, admin);
  assert!(matches!(
    fx.accounts.resolve_identity("ghost@example.com").await,
    Err(StoreError::BadCredentials)
  ));

  assert_eq!(fx.accounts.get_user(admin.user_id).await.unwrap().role, Role::Admin);
  assert!(fx.accounts.get_user_by_email("root@example.com").await.is_ok());
  assert!(matches!(
    fx.accounts.get_user(999).await,
    Err(StoreError::NotFound { entity: "User", .. })
  ));
}

#[tokio::test]
async fn test_users_with_orders_cannot_be_deleted() {
  let fx = Fixture::new();
  let product = fx.product("Thing", dec!(1.00), 3).await;
  let buyer = fx.customer("buyer@example.com").await;
  let idle = fx.customer("idle@example.com").await;
  fx.orders
    .place_order(&buyer, &PlaceOrderRequest::new([(product.id, 1)]))
    .await
    .unwrap();

  assert!(matches!(
    fx.accounts.delete_user(buyer.user_id).await,
    Err(StoreError::Conflict(_))
  ));
  fx.accounts.delete_user(idle.user_id).await.unwrap();
  assert!(fx.accounts.get_user(idle.user_id).await.is_err());
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent() {
  let fx = Fixture::new();
  assert!(seed::ensure_admin(&fx.accounts, "admin@example.com", "admin12345").await.unwrap());
  assert!(!seed::ensure_admin(&fx.accounts, "admin@example.com", "admin12345").await.unwrap());

  let admin = fx.accounts.authenticate("admin@example.com", "admin12345").await.unwrap();
  assert_eq!(admin.role, Role::Admin);
}

#[test]
fn test_password_hash_is_not_serialized() {
  let user = storefront::model::User {
    id: 1,
    first_name: "Grace".to_string(),
    last_name: "Hopper".to_string(),
    email: "grace@example.com".to_string(),
    password_hash: "$argon2id$secret".to_string(),
    role: Role::User,
    phone: None,
    address: None,
    created_at: chrono::Utc::now(),
  };
  let json = serde_json::to_value(&user).unwrap();
  assert!(json.get("passwordHash").is_none());
  assert_eq!(json["role"], "USER");
  assert_eq!(json["firstName"], "Grace");
}
