//! Error types for the state layer
//!
//! Adapter failures never propagate past the store boundary: the catalog
//! cache converts them to state (error field) or swallows them on the
//! background path. The only user-visible hard stop is the checkout gate.

use thiserror::Error;

/// Catalog source (remote API) failures
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Persistent store failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Checkout flow failures
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Reconciliation adjusted the cart; the report must be acknowledged
    /// before the order can be submitted.
    #[error("cart adjustments pending acknowledgment")]
    AdjustmentsPending,

    #[error("cart is empty")]
    EmptyCart,
}
