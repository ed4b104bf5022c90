//! Derived catalog views
//!
//! Pure filtering/sorting/grouping over a product snapshot. The catalog
//! store memoizes the results keyed by (products generation, filter
//! revision) so a view is recomputed only when one of its inputs changed.

use serde::{Deserialize, Serialize};
use shared::{pricing, text, Product};

/// Sort order for the filtered product list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Keep the source's fetch order
    None,
    PriceAsc,
    PriceDesc,
    Name,
    #[default]
    Popularity,
}

/// Catalog filter state mutated by the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub hide_preorder: bool,
    /// Legacy single-franchise filter, superseded by `franchises`
    pub franchise: Option<String>,
    /// Multi-select franchise filter; takes priority over `franchise`
    pub franchises: Vec<String>,
    pub search: String,
    pub presentations: Vec<String>,
    pub languages: Vec<String>,
    pub sort_by: SortBy,
}

impl FilterState {
    /// True when every filter is at its default and the sort is the
    /// default popularity order. Carousels are only shown then.
    pub fn is_default(&self) -> bool {
        !self.hide_preorder
            && self.franchise.is_none()
            && self.franchises.is_empty()
            && self.search.is_empty()
            && self.presentations.is_empty()
            && self.languages.is_empty()
            && self.sort_by == SortBy::Popularity
    }
}

/// Products with a nonzero preorder quantity.
pub fn preorder(products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.inventory.preorder != 0)
        .cloned()
        .collect()
}

/// Discounted products, excluding preorders (those get their own carousel).
pub fn discounted(products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.inventory.preorder == 0 && pricing::has_discount(p))
        .cloned()
        .collect()
}

/// Value-tier carousel: deck-equivalent presentations, or ES/MX singles
/// sleeves. Excludes anything already surfaced as preorder or discounted.
pub fn value_tier(products: &[Product]) -> Vec<Product> {
    products
        .iter()
        .filter(|p| {
            if p.inventory.preorder != 0 || pricing::has_discount(p) {
                return false;
            }
            p.presentation == "ALE"
                || ((p.language == "ES" || p.language == "MX")
                    && (p.presentation == "SBR" || p.presentation == "SSBR"))
        })
        .cloned()
        .collect()
}

/// Apply filters in order (preorder, franchise, search, presentation,
/// language) then the selected sort.
pub fn filtered(products: &[Product], filters: &FilterState) -> Vec<Product> {
    let search = text::fold(&filters.search);

    let mut result: Vec<Product> = products
        .iter()
        .filter(|p| {
            if filters.hide_preorder && p.inventory.preorder != 0 {
                return false;
            }
            if filters.franchises.is_empty() {
                // Legacy single-select only applies when no multi-select is active
                if let Some(franchise) = &filters.franchise {
                    if &p.franchise != franchise {
                        return false;
                    }
                }
            } else if !filters.franchises.contains(&p.franchise) {
                return false;
            }
            if !search.is_empty() && !text::fold(&p.name).contains(&search) {
                return false;
            }
            true
        })
        .filter(|p| {
            filters.presentations.is_empty() || filters.presentations.contains(&p.presentation)
        })
        .filter(|p| filters.languages.is_empty() || filters.languages.contains(&p.language))
        .cloned()
        .collect();

    match filters.sort_by {
        SortBy::None => {}
        SortBy::PriceAsc => result.sort_by(|a, b| {
            pricing::final_price(a)
                .partial_cmp(&pricing::final_price(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::PriceDesc => result.sort_by(|a, b| {
            pricing::final_price(b)
                .partial_cmp(&pricing::final_price(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::Name => result.sort_by(|a, b| text::fold(&a.name).cmp(&text::fold(&b.name))),
        SortBy::Popularity => result.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }

    result
}
