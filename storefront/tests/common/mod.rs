//! Shared fixtures for integration tests
#![allow(dead_code)]

use shared::{InventoryBlock, PriceBlock, Product};

pub fn product(id: i64, available: i32, preorder: i32) -> Product {
    Product {
        id,
        sku: format!("SKU-{id}"),
        franchise: "POK".to_string(),
        language: "EN".to_string(),
        sub_code: String::new(),
        presentation: "SBR".to_string(),
        name: format!("Product {id}"),
        release_date: "2024-01-01".to_string(),
        popularity: id as f64,
        prices: PriceBlock {
            retail_usd: 10.0,
            retail_local: 400.0,
            ..Default::default()
        },
        inventory: InventoryBlock {
            available,
            preorder,
            reserved: 0,
            on_hold: 0,
        },
    }
}

pub fn discounted_product(id: i64, retail_usd: f64, discount_usd: f64) -> Product {
    let mut p = product(id, 10, 0);
    p.prices.retail_usd = retail_usd;
    p.prices.discount_usd = Some(discount_usd);
    p
}
