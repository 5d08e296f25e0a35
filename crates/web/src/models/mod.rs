//! Domain models.
//!
//! These types are validated domain objects, separate from the row types
//! used inside the repositories.

pub mod customer;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use customer::{Customer, CustomerSummary};
pub use order::{Order, OrderCounts};
pub use product::{Product, ProductChoice};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
