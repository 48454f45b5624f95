// src/lib.rs

//! Storefront: catalog, accounts and order placement for an e-commerce backend.
//!
//! The crate is storage-agnostic. Services talk to the traits in [`store`]; a
//! PostgreSQL implementation lives in the server crate and [`memory::InMemoryStore`]
//! ships here.
//!
//! The one piece with a hard invariant is [`placement::OrderPlacement`]: stock never
//! goes negative, and a placement either persists the order, its lines and every stock
//! decrement together, or none of them.

pub mod accounts;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod memory;
pub mod model;
pub mod orders;
pub mod placement;
pub mod seed;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::accounts::{AccountService, Registration};
pub use crate::catalog::CatalogService;
pub use crate::error::{StoreError, StoreResult};
pub use crate::identity::Identity;
pub use crate::memory::InMemoryStore;
pub use crate::orders::{OrderService, StatusPolicy};
pub use crate::placement::{OrderLineRequest, OrderPlacement, PlaceOrderRequest};
pub use crate::store::{AccountStore, CatalogStore, OrderStore, Storefront, TransactionalStore, UnitOfWork};
