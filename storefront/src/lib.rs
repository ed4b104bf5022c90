//! Client-side state layer for the storefront
//!
//! Maintains a locally cached product catalog (stale-while-revalidate
//! refresh over a remote source, backed by async persistence) and a
//! shopping cart whose line quantities never exceed currently known
//! purchasable stock. Whenever the catalog changes, the cart is reconciled
//! against it and any removals/reductions surface as an adjustment report
//! the UI must acknowledge; a pending report blocks order submission.

pub mod adapters;
pub mod checkout;
pub mod config;
pub mod error;
pub mod logger;
pub mod state;
pub mod stores;

// Re-exports
pub use checkout::{CustomerInfo, DeliveryMethod};
pub use config::Config;
pub use error::{CheckoutError, PersistError, SourceError};
pub use state::Storefront;
pub use stores::{CartStore, CatalogStore, FilterState, SortBy};
