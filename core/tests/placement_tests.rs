// tests/placement_tests.rs
mod common;

use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront::model::{money, NewProduct, OrderStatus};
use storefront::{CatalogStore, OrderPlacement, OrderService, PlaceOrderRequest, StatusPolicy, StoreError};

#[tokio::test]
async fn test_single_line_order_prices_and_decrements() {
  let fx = Fixture::new();
  let product = fx.product("Widget", dec!(10.00), 5).await;
  let customer = fx.customer("buyer@example.com").await;

  let summary = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 2)]))
    .await
    .unwrap();

  assert_eq!(summary.total_amount, dec!(20.00));
  assert_eq!(summary.status, OrderStatus::Pending);
  assert_eq!(summary.user_id, customer.user_id);
  assert_eq!(summary.items.len(), 1);
  let line = &summary.items[0];
  assert_eq!(line.product_id, product.id);
  assert_eq!(line.product_name, "Widget");
  assert_eq!(line.quantity, 2);
  assert_eq!(line.unit_price, dec!(10.00));
  assert_eq!(line.subtotal, dec!(20.00));
  assert_eq!(fx.stock_of(product.id).await, 3);

  // The persisted order reads back identically.
  let stored = fx.orders.get_order(summary.id).await.unwrap();
  assert_eq!(stored, summary);
}

#[tokio::test]
async fn test_total_is_sum_of_line_subtotals() {
  let fx = Fixture::new();
  let laptop = fx.product("Laptop", dec!(1999.99), 15).await;
  let phone = fx.product("Phone", dec!(899.99), 8).await;
  let book = fx.product("Book", dec!(45.99), 3).await;
  let customer = fx.customer("buyer@example.com").await;

  let summary = fx
    .orders
    .place_order(
      &customer,
      &PlaceOrderRequest::new([(laptop.id, 1), (phone.id, 2), (book.id, 3)]),
    )
    .await
    .unwrap();

  let expected: Decimal = summary.items.iter().map(|l| l.unit_price * Decimal::from(l.quantity)).sum();
  assert_eq!(summary.total_amount, expected);
  assert_eq!(summary.total_amount, dec!(3937.94));
  assert_eq!(summary.total_amount.to_string(), "3937.94");

  assert_eq!(fx.stock_of(laptop.id).await, 14);
  assert_eq!(fx.stock_of(phone.id).await, 6);
  assert_eq!(fx.stock_of(book.id).await, 0);

  // Lines come back in the order they were submitted.
  let ids: Vec<_> = summary.items.iter().map(|l| l.product_id).collect();
  assert_eq!(ids, vec![laptop.id, phone.id, book.id]);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_everything_untouched() {
  let fx = Fixture::new();
  let plenty = fx.product("Plenty", dec!(5.00), 10).await;
  let scarce = fx.product("Scarce", dec!(7.50), 1).await;
  let customer = fx.customer("buyer@example.com").await;

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(plenty.id, 4), (scarce.id, 2)]))
    .await
    .unwrap_err();

  match err {
    StoreError::InsufficientStock {
      product_name,
      available,
      requested,
    } => {
      assert_eq!(product_name, "Scarce");
      assert_eq!(available, 1);
      assert_eq!(requested, 2);
    }
    other => panic!("Expected InsufficientStock, got {:?}", other),
  }

  // The earlier line's decrement was rolled back too.
  assert_eq!(fx.stock_of(plenty.id).await, 10);
  assert_eq!(fx.stock_of(scarce.id).await, 1);
  assert_eq!(fx.order_count().await, 0);
}

#[tokio::test]
async fn test_unknown_product_fails_without_side_effects() {
  let fx = Fixture::new();
  let known = fx.product("Known", dec!(3.00), 4).await;
  let customer = fx.customer("buyer@example.com").await;

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(known.id, 2), (9_999, 1)]))
    .await
    .unwrap_err();

  assert!(
    matches!(err, StoreError::NotFound { entity: "Product", ref id } if id == "9999"),
    "unexpected error: {:?}",
    err
  );
  assert_eq!(fx.stock_of(known.id).await, 4);
  assert_eq!(fx.order_count().await, 0);
}

#[tokio::test]
async fn test_totals_above_the_recordable_limit_are_rejected() {
  let fx = Fixture::new();
  let yacht = fx.product("Yacht", money::MAX_PRICE, 1_000).await;
  let customer = fx.customer("buyer@example.com").await;

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(yacht.id, 101)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)), "unexpected error: {:?}", err);
  assert_eq!(fx.stock_of(yacht.id).await, 1_000);
  assert_eq!(fx.order_count().await, 0);

  let summary = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(yacht.id, 100)]))
    .await
    .unwrap();
  assert_eq!(summary.total_amount, dec!(999999999999.00));
  assert_eq!(fx.stock_of(yacht.id).await, 900);
}

#[tokio::test]
async fn test_overflowing_line_amounts_roll_back_instead_of_panicking() {
  let fx = Fixture::new();
  // Written straight to the store, past catalog validation.
  let yacht = fx
    .store
    .insert_product(NewProduct {
      name: "Yacht".to_string(),
      description: None,
      price: dec!(100000000000000000000000000),
      stock: 1_000,
      category_id: None,
    })
    .await
    .unwrap();
  let customer = fx.customer("buyer@example.com").await;

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(yacht.id, 1_000)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)), "unexpected error: {:?}", err);
  assert_eq!(fx.stock_of(yacht.id).await, 1_000);
  assert_eq!(fx.order_count().await, 0);
}

#[tokio::test]
async fn test_errors_follow_submission_order() {
  let fx = Fixture::new();
  // Higher id, submitted first, short on stock.
  let first = fx.product("First", dec!(1.00), 0).await;
  let customer = fx.customer("buyer@example.com").await;

  // The unknown id sorts before `first` when locking, but the out-of-stock line was
  // submitted first, so that is the reported failure.
  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(first.id, 1), (0, 1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::InsufficientStock { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_repeated_product_lines_share_stock() {
  let fx = Fixture::new();
  let product = fx.product("Gadget", dec!(2.50), 5).await;
  let customer = fx.customer("buyer@example.com").await;

  let summary = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 2), (product.id, 3)]))
    .await
    .unwrap();
  assert_eq!(summary.items.len(), 2);
  assert_eq!(summary.total_amount, dec!(12.50));
  assert_eq!(fx.stock_of(product.id).await, 0);

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 0)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)));

  // Stock left after the first line is what the second line is checked against.
  let other = fx.product("Other", dec!(1.00), 3).await;
  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(other.id, 2), (other.id, 2)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::InsufficientStock { available: 1, requested: 2, .. }));
  assert_eq!(fx.stock_of(other.id).await, 3);
}

#[tokio::test]
async fn test_request_validation() {
  let fx = Fixture::new();
  let product = fx.product("Thing", dec!(1.00), 5).await;
  let customer = fx.customer("buyer@example.com").await;

  let empty = fx.orders.place_order(&customer, &PlaceOrderRequest::new([])).await;
  assert!(matches!(empty, Err(StoreError::Validation(_))));

  let negative = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, -1)]))
    .await;
  assert!(matches!(negative, Err(StoreError::Validation(_))));

  assert_eq!(fx.stock_of(product.id).await, 5);
}

#[tokio::test]
async fn test_exact_stock_can_be_sold_out() {
  let fx = Fixture::new();
  let product = fx.product("Last units", dec!(9.99), 3).await;
  let customer = fx.customer("buyer@example.com").await;

  fx.orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 3)]))
    .await
    .unwrap();
  assert_eq!(fx.stock_of(product.id).await, 0);

  let err = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 1)]))
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::InsufficientStock { available: 0, requested: 1, .. }));
}

#[tokio::test]
async fn test_price_edit_does_not_rewrite_history() {
  let fx = Fixture::new();
  let product = fx.product("Volatile", dec!(10.00), 5).await;
  let customer = fx.customer("buyer@example.com").await;

  let summary = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 2)]))
    .await
    .unwrap();

  fx.catalog
    .update_product(
      product.id,
      NewProduct {
        name: "Volatile".to_string(),
        description: None,
        price: dec!(99.00),
        stock: 3,
        category_id: None,
      },
    )
    .await
    .unwrap();

  let stored = fx.orders.get_order(summary.id).await.unwrap();
  assert_eq!(stored.total_amount, dec!(20.00));
  assert_eq!(stored.items[0].unit_price, dec!(10.00));
  assert_eq!(stored.items[0].subtotal, dec!(20.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_never_oversell() {
  let fx = Arc::new(Fixture::new());
  let product = fx.product("Hot item", dec!(15.00), 5).await;
  let alice = fx.customer("alice@example.com").await;
  let bob = fx.customer("bob@example.com").await;

  let mut handles = Vec::new();
  for customer in [alice, bob] {
    let fx = fx.clone();
    let product_id = product.id;
    handles.push(tokio::spawn(async move {
      fx.orders
        .place_order(&customer, &PlaceOrderRequest::new([(product_id, 3)]))
        .await
    }));
  }

  let mut successes = 0;
  let mut shortages = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => successes += 1,
      Err(StoreError::InsufficientStock { available, requested, .. }) => {
        assert_eq!(available, 2);
        assert_eq!(requested, 3);
        shortages += 1;
      }
      Err(other) => panic!("unexpected error: {:?}", other),
    }
  }

  assert_eq!(successes, 1);
  assert_eq!(shortages, 1);
  assert_eq!(fx.stock_of(product.id).await, 2);
  assert_eq!(fx.order_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_buyers_sell_exactly_the_stock() {
  let fx = Arc::new(Fixture::new());
  let product = fx.product("Limited", dec!(1.00), 10).await;
  let customer = fx.customer("crowd@example.com").await;

  let mut handles = Vec::new();
  for _ in 0..25 {
    let fx = fx.clone();
    let customer = customer.clone();
    let product_id = product.id;
    handles.push(tokio::spawn(async move {
      fx.orders
        .place_order(&customer, &PlaceOrderRequest::new([(product_id, 1)]))
        .await
        .is_ok()
    }));
  }

  let mut sold = 0;
  for handle in handles {
    if handle.await.unwrap() {
      sold += 1;
    }
  }
  assert_eq!(sold, 10);
  assert_eq!(fx.stock_of(product.id).await, 0);
  assert_eq!(fx.order_count().await, 10);
}

#[tokio::test]
async fn test_store_failures_roll_back_stock() {
  for fail_at in [FailAt::InsertOrder, FailAt::InsertItem, FailAt::Commit] {
    let fx = Fixture::new();
    let product = fx.product("Fragile", dec!(4.00), 6).await;
    let customer = fx.customer("buyer@example.com").await;

    let placement = OrderPlacement::new(Arc::new(FailingStore {
      inner: fx.store.clone(),
      fail_at,
    }));
    let err = placement
      .place(&customer, &PlaceOrderRequest::new([(product.id, 2)]))
      .await
      .unwrap_err();

    assert!(matches!(err, StoreError::Persistence { .. }), "{:?}: got {:?}", fail_at, err);
    assert_eq!(fx.stock_of(product.id).await, 6, "{:?}", fail_at);
    assert_eq!(fx.order_count().await, 0, "{:?}", fail_at);
  }
}

#[tokio::test]
async fn test_orders_listed_per_user() {
  let fx = Fixture::new();
  let product = fx.product("Common", dec!(2.00), 10).await;
  let alice = fx.customer("alice@example.com").await;
  let bob = fx.customer("bob@example.com").await;

  fx.orders
    .place_order(&alice, &PlaceOrderRequest::new([(product.id, 1)]))
    .await
    .unwrap();
  fx.orders
    .place_order(&alice, &PlaceOrderRequest::new([(product.id, 2)]))
    .await
    .unwrap();
  fx.orders
    .place_order(&bob, &PlaceOrderRequest::new([(product.id, 3)]))
    .await
    .unwrap();

  let alices = fx.orders.orders_for_user(alice.user_id).await.unwrap();
  assert_eq!(alices.len(), 2);
  assert!(alices.iter().all(|o| o.user_id == alice.user_id && !o.items.is_empty()));
  assert_eq!(fx.orders.orders_of(&bob).await.unwrap().len(), 1);

  let missing = fx.orders.orders_for_user(4_242).await;
  assert!(matches!(missing, Err(StoreError::NotFound { entity: "User", .. })));
}

#[tokio::test]
async fn test_order_service_shares_store_with_other_services() {
  // A service built on a different policy still sees the same orders.
  let fx = Fixture::new();
  let product = fx.product("Shared", dec!(1.00), 2).await;
  let customer = fx.customer("buyer@example.com").await;
  let placed = fx
    .orders
    .place_order(&customer, &PlaceOrderRequest::new([(product.id, 1)]))
    .await
    .unwrap();

  let strict = OrderService::new(fx.store.clone(), StatusPolicy::Strict);
  assert_eq!(strict.get_order(placed.id).await.unwrap(), placed);
}
