//! Cart line and reconciliation report types

use serde::{Deserialize, Serialize};

/// Cart line item - one per distinct product
///
/// `sku`, `name`, `unit_price` and `discount_applied` are snapshots taken
/// at add time. They intentionally do not track later catalog drift; only
/// reconciliation touches quantity and presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    /// Always > 0; a line that would reach 0 is removed instead
    pub qty: u32,
    /// USD-equivalent unit price captured at add time
    pub unit_price: f64,
    pub discount_applied: bool,
}

/// What caused a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTrigger {
    /// Catalog refresh detected changes
    Refresh,
    /// Pre-submission check during checkout
    Checkout,
}

/// Why a cart line was removed during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemovalReason {
    /// Product no longer present in the catalog
    Missing,
    /// Product present but no longer purchasable
    NoStock,
}

/// A cart line dropped by reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedItem {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub reason: RemovalReason,
}

/// A cart line whose quantity was clamped by reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedItem {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub from: u32,
    pub to: u32,
}

/// Change set produced by one reconciliation pass
///
/// Ephemeral: lives only between reconciliation detecting changes and the
/// UI acknowledging the report. At most one report is live at a time; a
/// newer reconciliation overwrites an unacknowledged one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentReport {
    pub trigger: AdjustmentTrigger,
    pub removed: Vec<RemovedItem>,
    pub reduced: Vec<ReducedItem>,
}

impl AdjustmentReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.reduced.is_empty()
    }
}
