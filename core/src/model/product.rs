// core/src/model/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CategoryId;

pub type ProductId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  /// Sellable units. Never negative.
  pub stock: i32,
  pub category_id: Option<CategoryId>,
}

/// Fields an admin supplies when creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: Decimal,
  pub stock: i32,
  #[serde(default)]
  pub category_id: Option<CategoryId>,
}
