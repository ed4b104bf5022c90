//! State stores
//!
//! The catalog cache and the cart engine each own their state exclusively;
//! everything else reads derived snapshots. The two are wired together by
//! [`crate::state::Storefront`], which runs cart reconciliation whenever
//! the catalog's product list changes.

pub mod cart;
pub mod catalog;
mod persist;
pub mod views;

pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use views::{FilterState, SortBy};
