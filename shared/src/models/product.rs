//! Product Model
//!
//! Immutable-per-fetch catalog record. Instances are replaced wholesale on
//! every catalog refresh, never mutated in place.

use serde::{Deserialize, Serialize};

/// Artificial cap applied when the source reports "unlimited" stock (-1).
pub const UNLIMITED_PURCHASE_CAP: u32 = 100;

/// Pricing block for a product
///
/// `retail_usd` is the USD-equivalent list price ("detal"); `retail_local`
/// is the same price in local currency ("b_detal"). The `official_ref`
/// fields are backend-precomputed USD references at the official exchange
/// rate, used for cross-currency equivalence in order summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBlock {
    pub retail_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_usd: Option<f64>,
    pub retail_local: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_local: Option<f64>,
    /// Official-rate USD reference for the local retail price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_ref: Option<f64>,
    /// Official-rate USD reference for the local discounted price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_ref_discount: Option<f64>,
}

impl Default for PriceBlock {
    fn default() -> Self {
        Self {
            retail_usd: 0.0,
            discount_usd: None,
            retail_local: 0.0,
            discount_local: None,
            official_ref: None,
            official_ref_discount: None,
        }
    }
}

/// Inventory block for a product
///
/// `available` uses sign-based semantics: `-1` means unlimited (capped at
/// [`UNLIMITED_PURCHASE_CAP`] for purchase purposes), `0` or anything below
/// `-1` means not purchasable, positive values are the literal count.
/// `reserved` and `on_hold` are tracked for reporting but never enter the
/// purchasability rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryBlock {
    pub available: i32,
    pub preorder: i32,
    #[serde(default)]
    pub reserved: i32,
    #[serde(default)]
    pub on_hold: i32,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    /// Franchise code (e.g. POK, MTG, YGO)
    pub franchise: String,
    /// Language code (e.g. ES, MX, EN, JP; NA = no language)
    pub language: String,
    /// Secondary classification code
    #[serde(default)]
    pub sub_code: String,
    /// Presentation code, mapped to a display label via the fixed table in
    /// [`crate::pricing::presentation_label`]
    #[serde(default)]
    pub presentation: String,
    pub name: String,
    /// ISO date (YYYY-MM-DD)
    #[serde(default)]
    pub release_date: String,
    /// Popularity score, used for default ordering
    #[serde(default)]
    pub popularity: f64,
    pub prices: PriceBlock,
    pub inventory: InventoryBlock,
}

impl Product {
    /// Maximum unit count a cart line may hold for this product.
    ///
    /// - `available == -1` → unlimited, capped at 100
    /// - `available == 0` or `available < -1` → not purchasable
    /// - otherwise `max(0, available) + max(0, preorder)`
    pub fn max_purchasable(&self) -> u32 {
        let available = self.inventory.available;
        if available == -1 {
            return UNLIMITED_PURCHASE_CAP;
        }
        if available == 0 || available < -1 {
            return 0;
        }
        let available = available.max(0) as u32;
        let preorder = self.inventory.preorder.max(0) as u32;
        available + preorder
    }
}
