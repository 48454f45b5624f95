// core/src/model/money.rs

//! Decimal helpers for prices and order totals.

use rust_decimal::Decimal;

use crate::error::{StoreError, StoreResult};

/// Number of fractional digits every stored amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Largest unit price a product can carry (`NUMERIC(12, 2)`).
pub const MAX_PRICE: Decimal = cents(999_999_999_999);

/// Largest order total that can be recorded (`NUMERIC(14, 2)`).
pub const MAX_TOTAL: Decimal = cents(99_999_999_999_999);

const fn cents(amount: u64) -> Decimal {
  Decimal::from_parts(amount as u32, (amount >> 32) as u32, 0, false, MONEY_SCALE)
}

/// Validates a price coming from a caller and rescales it to two fractional digits.
///
/// Negative amounts and amounts that need more than two fractional digits are rejected
/// rather than rounded, so `10.005` never silently becomes `10.01`.
pub fn normalize_price(amount: Decimal) -> StoreResult<Decimal> {
  if amount.is_sign_negative() && !amount.is_zero() {
    return Err(StoreError::Validation(format!("Price cannot be negative: {}", amount)));
  }
  if amount.normalize().scale() > MONEY_SCALE {
    return Err(StoreError::Validation(format!(
      "Price cannot have more than {} decimal places: {}",
      MONEY_SCALE, amount
    )));
  }
  if amount > MAX_PRICE {
    return Err(StoreError::Validation(format!(
      "Price cannot exceed {}: {}",
      MAX_PRICE, amount
    )));
  }
  let mut scaled = amount.abs();
  scaled.rescale(MONEY_SCALE);
  Ok(scaled)
}

/// `unit_price × quantity`, kept at the money scale.
///
/// Saturates instead of overflowing; stored prices are bounded by [`MAX_PRICE`], so a
/// persisted line never gets near the limit.
pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
  let mut subtotal = unit_price.saturating_mul(Decimal::from(quantity));
  subtotal.rescale(MONEY_SCALE);
  subtotal
}

/// Adds a line to a running order total, refusing totals above [`MAX_TOTAL`].
pub fn add_line(total: Decimal, unit_price: Decimal, quantity: i32) -> StoreResult<Decimal> {
  unit_price
    .checked_mul(Decimal::from(quantity))
    .and_then(|subtotal| total.checked_add(subtotal))
    .filter(|sum| *sum <= MAX_TOTAL)
    .map(|mut sum| {
      sum.rescale(MONEY_SCALE);
      sum
    })
    .ok_or_else(|| StoreError::Validation(format!("Order total cannot exceed {}.", MAX_TOTAL)))
}

/// Zero at the money scale, the starting point for running totals.
pub fn zero() -> Decimal {
  Decimal::new(0, MONEY_SCALE)
}
