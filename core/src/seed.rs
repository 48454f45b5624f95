// core/src/seed.rs

//! Demo catalog and bootstrap admin account.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::accounts::{AccountService, Registration};
use crate::catalog::CatalogService;
use crate::error::StoreResult;
use crate::model::{NewCategory, NewProduct, Role};

struct SeedProduct {
  name: &'static str,
  description: &'static str,
  price_cents: i64,
  stock: i32,
  category: &'static str,
}

const SEED_CATEGORIES: [(&str, &str); 3] = [
  ("Electronics", "Electronic devices and gadgets"),
  ("Clothing", "Fashion and accessories"),
  ("Books", "Books and publications"),
];

const SEED_PRODUCTS: [SeedProduct; 4] = [
  SeedProduct {
    name: "MacBook Pro M3",
    description: "High-performance laptop",
    price_cents: 199_999,
    stock: 15,
    category: "Electronics",
  },
  SeedProduct {
    name: "iPhone 15",
    description: "Latest generation smartphone",
    price_cents: 89_999,
    stock: 8,
    category: "Electronics",
  },
  SeedProduct {
    name: "T-Shirt Angular",
    description: "Premium Angular developer t-shirt",
    price_cents: 2_599,
    stock: 0,
    category: "Clothing",
  },
  SeedProduct {
    name: "Effective Java",
    description: "Guide to Java best practices",
    price_cents: 4_599,
    stock: 3,
    category: "Books",
  },
];

/// Fills an empty catalog. Returns the number of products created (0 when the catalog
/// already had categories).
#[instrument(name = "seed::seed_catalog", skip(catalog), err(Display))]
pub async fn seed_catalog(catalog: &CatalogService) -> StoreResult<usize> {
  if !catalog.list_categories().await?.is_empty() {
    info!("Catalog already populated; skipping seed.");
    return Ok(0);
  }

  let mut category_ids = Vec::with_capacity(SEED_CATEGORIES.len());
  for (name, description) in SEED_CATEGORIES {
    let category = catalog
      .create_category(NewCategory {
        name: name.to_string(),
        description: Some(description.to_string()),
      })
      .await?;
    category_ids.push((name, category.id));
  }

  for seed in &SEED_PRODUCTS {
    let category_id = category_ids
      .iter()
      .find(|(name, _)| *name == seed.category)
      .map(|(_, id)| *id);
    catalog
      .create_product(NewProduct {
        name: seed.name.to_string(),
        description: Some(seed.description.to_string()),
        price: Decimal::new(seed.price_cents, 2),
        stock: seed.stock,
        category_id,
      })
      .await?;
  }

  info!(products = SEED_PRODUCTS.len(), "Seed catalog created.");
  Ok(SEED_PRODUCTS.len())
}

/// Creates an ADMIN account unless the email is already registered.
#[instrument(name = "seed::ensure_admin", skip(accounts, password), err(Display))]
pub async fn ensure_admin(accounts: &AccountService, email: &str, password: &str) -> StoreResult<bool> {
  if accounts.email_exists(email).await? {
    return Ok(false);
  }
  accounts
    .create_user(
      Registration {
        first_name: "Store".to_string(),
        last_name: "Admin".to_string(),
        email: email.to_string(),
        password: password.to_string(),
        phone: None,
        address: None,
      },
      Role::Admin,
    )
    .await?;
  info!("Admin account created.");
  Ok(true)
}
