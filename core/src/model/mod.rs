// core/src/model/mod.rs

//! Records the storefront persists, plus the read models built from them.

pub mod category;
pub mod money;
pub mod order;
pub mod product;
pub mod user;

pub use category::{Category, CategoryId, NewCategory};
pub use order::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderLine, OrderStatus, OrderSummary};
pub use product::{NewProduct, Product, ProductId};
pub use user::{NewUser, Role, User, UserId};
