//! Shared types for the storefront state layer
//!
//! Domain models (products, cart lines, adjustment reports) and the pure
//! pricing/derivation helpers consumed by both the catalog cache and the
//! cart engine.

pub mod models;
pub mod pricing;
pub mod text;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::cart::{
    AdjustmentReport, AdjustmentTrigger, CartItem, ReducedItem, RemovalReason, RemovedItem,
};
pub use models::product::{InventoryBlock, PriceBlock, Product};
pub use pricing::{CurrencyMode, StockState};
