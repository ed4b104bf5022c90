//! Pricing and derivation helpers
//!
//! Pure functions over a [`Product`]: discount detection, final price
//! selection, stock classification and the presentation-code lookup table.
//! Currency selection is an explicit [`CurrencyMode`] parameter so callers
//! stay testable; there is no ambient currency flag.

use serde::{Deserialize, Serialize};

use crate::models::product::Product;

/// Which price fields derivations and totals read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyMode {
    /// USD-only "discount mode"
    #[default]
    Usd,
    /// Local-currency mode
    Local,
}

/// Stock classification derived from inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    Preorder,
    Many,
    Few,
    Last,
    None,
}

/// A discount figure is valid only when strictly between zero and the
/// matching retail price.
fn valid_discount(discount: Option<f64>, retail: f64) -> Option<f64> {
    discount.filter(|d| *d > 0.0 && *d < retail)
}

/// Valid USD discount price, if any.
pub fn usd_discount(p: &Product) -> Option<f64> {
    valid_discount(p.prices.discount_usd, p.prices.retail_usd)
}

/// Valid local-currency discount price, if any.
pub fn local_discount(p: &Product) -> Option<f64> {
    valid_discount(p.prices.discount_local, p.prices.retail_local)
}

/// Whether the product carries a valid discount in USD or local currency.
pub fn has_discount(p: &Product) -> bool {
    usd_discount(p).is_some() || local_discount(p).is_some()
}

/// Percentage off, rounded to the nearest integer.
///
/// Prefers the USD figure when valid (consistency with marketing copy),
/// falls back to the local-currency figure. `None` when no valid discount
/// exists.
pub fn discount_percent(p: &Product) -> Option<u32> {
    if let Some(d) = valid_discount(p.prices.discount_usd, p.prices.retail_usd) {
        return Some((((p.prices.retail_usd - d) / p.prices.retail_usd) * 100.0).round() as u32);
    }
    if let Some(d) = valid_discount(p.prices.discount_local, p.prices.retail_local) {
        return Some((((p.prices.retail_local - d) / p.prices.retail_local) * 100.0).round() as u32);
    }
    None
}

/// Final USD price: valid USD discount if present, else retail.
pub fn final_price(p: &Product) -> f64 {
    valid_discount(p.prices.discount_usd, p.prices.retail_usd).unwrap_or(p.prices.retail_usd)
}

/// Final price in the active currency mode.
///
/// USD mode reads the USD fields; local mode reads the local-currency
/// discounted price if valid, else local retail.
pub fn final_price_converted(p: &Product, mode: CurrencyMode) -> f64 {
    match mode {
        CurrencyMode::Usd => final_price(p),
        CurrencyMode::Local => valid_discount(p.prices.discount_local, p.prices.retail_local)
            .unwrap_or(p.prices.retail_local),
    }
}

/// Classify inventory for display badges.
pub fn stock_state(p: &Product) -> StockState {
    if p.inventory.preorder != 0 {
        return StockState::Preorder;
    }
    match p.inventory.available {
        0 => StockState::None,
        1 => StockState::Last,
        2..=5 => StockState::Few,
        _ => StockState::Many,
    }
}

/// Display label for a presentation code. Unknown codes map to "N/A".
pub fn presentation_label(code: &str) -> &'static str {
    match code {
        "SBR" | "SSBR" => "Sobre",
        "PAQ" | "BB6" | "3PK" => "Paquete",
        "UNI" => "Unidad",
        "PAR" => "Par",
        "TRI" => "Trio",
        "TIN" => "Lata",
        "B36" | "BBA" | "SUR" | "PRC" | "PCO" | "BCO" | "CES" | "SPC" | "CJA" | "B24" | "SPE"
        | "MAT" => "Caja",
        "ETB" => "ETB",
        "ALE" => "Mazo",
        "DCK" | "BD1" | "BD2" | "BD3" => "Deck",
        "BLI" => "Blister",
        _ => "N/A",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::{InventoryBlock, PriceBlock};

    fn product(prices: PriceBlock, inventory: InventoryBlock) -> Product {
        Product {
            id: 1,
            sku: "SKU-1".to_string(),
            franchise: "POK".to_string(),
            language: "EN".to_string(),
            sub_code: String::new(),
            presentation: "SBR".to_string(),
            name: "Test".to_string(),
            release_date: "2024-01-01".to_string(),
            popularity: 0.0,
            prices,
            inventory,
        }
    }

    #[test]
    fn test_usd_discount() {
        let p = product(
            PriceBlock {
                retail_usd: 10.0,
                discount_usd: Some(8.0),
                retail_local: 400.0,
                ..Default::default()
            },
            InventoryBlock::default(),
        );
        assert!(has_discount(&p));
        assert_eq!(discount_percent(&p), Some(20));
        assert_eq!(final_price(&p), 8.0);
    }

    #[test]
    fn test_invalid_discounts_ignored() {
        // Zero, negative, and above-retail discounts are all invalid
        for bad in [0.0, -1.0, 10.0, 12.0] {
            let p = product(
                PriceBlock {
                    retail_usd: 10.0,
                    discount_usd: Some(bad),
                    retail_local: 400.0,
                    ..Default::default()
                },
                InventoryBlock::default(),
            );
            assert!(!has_discount(&p), "discount {bad} should be invalid");
            assert_eq!(discount_percent(&p), None);
            assert_eq!(final_price(&p), 10.0);
        }
    }

    #[test]
    fn test_local_only_discount() {
        let p = product(
            PriceBlock {
                retail_usd: 10.0,
                retail_local: 400.0,
                discount_local: Some(300.0),
                ..Default::default()
            },
            InventoryBlock::default(),
        );
        assert!(has_discount(&p));
        assert_eq!(discount_percent(&p), Some(25));
        // USD price unaffected by a local-only discount
        assert_eq!(final_price(&p), 10.0);
        assert_eq!(final_price_converted(&p, CurrencyMode::Local), 300.0);
        assert_eq!(final_price_converted(&p, CurrencyMode::Usd), 10.0);
    }

    #[test]
    fn test_stock_states() {
        let make = |available, preorder| {
            product(
                PriceBlock::default(),
                InventoryBlock {
                    available,
                    preorder,
                    reserved: 0,
                    on_hold: 0,
                },
            )
        };
        assert_eq!(stock_state(&make(0, 3)), StockState::Preorder);
        assert_eq!(stock_state(&make(0, 0)), StockState::None);
        assert_eq!(stock_state(&make(1, 0)), StockState::Last);
        assert_eq!(stock_state(&make(2, 0)), StockState::Few);
        assert_eq!(stock_state(&make(5, 0)), StockState::Few);
        assert_eq!(stock_state(&make(6, 0)), StockState::Many);
        assert_eq!(stock_state(&make(-1, 0)), StockState::Many);
    }

    #[test]
    fn test_presentation_labels() {
        assert_eq!(presentation_label("SBR"), "Sobre");
        assert_eq!(presentation_label("SSBR"), "Sobre");
        assert_eq!(presentation_label("3PK"), "Paquete");
        assert_eq!(presentation_label("MAT"), "Caja");
        assert_eq!(presentation_label("ALE"), "Mazo");
        assert_eq!(presentation_label("BD3"), "Deck");
        assert_eq!(presentation_label("BLI"), "Blister");
        assert_eq!(presentation_label("???"), "N/A");
        assert_eq!(presentation_label(""), "N/A");
    }
}
