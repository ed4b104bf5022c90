//! Checkout message construction
//!
//! Builds the human-readable itemized order summary sent to the store
//! operator. Pure over the cart lines, catalog snapshot, exchange rate and
//! currency mode; the checkout gate itself lives in
//! [`crate::state::Storefront::submit_order`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{pricing, CartItem, CurrencyMode, Product};

/// Delivery options offered at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Local delivery within the capital
    #[default]
    Caracas,
    /// Courier shipping anywhere in the country
    Nacional,
}

impl DeliveryMethod {
    fn label(&self) -> &'static str {
        match self {
            DeliveryMethod::Caracas => "Caracas",
            DeliveryMethod::Nacional => "Envío nacional",
        }
    }
}

/// Customer data collected by the checkout form; persisted between visits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    /// National ID ("cédula")
    pub customer_id: String,
    pub delivery: DeliveryMethod,
    pub payment: String,
}

/// Build the outbound order summary.
///
/// USD mode lists each line at its captured unit price with discount
/// annotations; local mode lists line totals in Bs with a USD equivalence
/// taken from the backend's official-rate references, falling back to
/// dividing by the exchange rate. Lines whose product vanished from the
/// catalog are skipped (reconciliation removes them before checkout).
pub fn build_order_message(
    items: &[CartItem],
    products: &[Product],
    rate: f64,
    mode: CurrencyMode,
    info: &CustomerInfo,
    now: DateTime<Utc>,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "Hola soy {} con cédula {} y mi pedido es:",
        info.name, info.customer_id
    ));
    lines.push(String::new());
    lines.push("Items:".to_string());

    let mut total_usd = 0.0;
    let mut total_bs = 0.0;

    for item in items {
        let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
            continue;
        };

        let unit_usd = item.unit_price;
        let has_usd_discount = pricing::usd_discount(product).is_some();
        let line_usd = unit_usd * item.qty as f64;
        total_usd += line_usd;

        let mut unit_bs = pricing::local_discount(product).unwrap_or(product.prices.retail_local);
        if unit_bs == 0.0 {
            unit_bs = unit_usd * rate;
        }
        let line_bs = unit_bs * item.qty as f64;
        total_bs += line_bs;

        match mode {
            CurrencyMode::Usd => {
                let retail = product.prices.retail_usd;
                let mut annotations = String::new();
                if has_usd_discount {
                    let percent = ((retail - unit_usd) / retail * 100.0).round();
                    annotations = format!(" (desc {percent:.0}%) (antes ${retail:.2})");
                }
                lines.push(format!(
                    "{}x {} - ${:.2}{}",
                    item.qty, item.name, unit_usd, annotations
                ));
            }
            CurrencyMode::Local => {
                let equivalence_usd = line_equivalence_usd(product, item.qty, line_bs, rate);
                lines.push(format!(
                    "{}x {} - Bs {} (= ${:.2})",
                    item.qty,
                    item.name,
                    line_bs.round() as i64,
                    equivalence_usd
                ));
            }
        }
    }

    lines.push(String::new());
    match mode {
        CurrencyMode::Usd => {
            lines.push(format!("Subtotal con descuento: ${total_usd:.2}"));
        }
        CurrencyMode::Local => {
            let mut equivalence_usd = 0.0;
            for item in items {
                let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
                    continue;
                };
                if let Some(reference) = official_reference(product) {
                    equivalence_usd += reference * item.qty as f64;
                }
            }
            if equivalence_usd == 0.0 && rate > 0.0 {
                equivalence_usd = total_bs / rate;
            }
            lines.push(format!(
                "Subtotal: Bs{} (≈ ${:.2} BCV)",
                total_bs.round() as i64,
                equivalence_usd
            ));
        }
    }

    lines.push(format!("Entrega: {}", info.delivery.label()));
    lines.push(format!("Forma de pago: {}", info.payment));
    lines.push(format!("Fecha: {}", now.format("%d/%m/%Y %H:%M:%S")));
    lines.push(String::new());
    lines.push("Gracias.".to_string());

    lines.join("\n")
}

/// Official-rate USD reference for one unit, matching whichever local
/// price (discounted or retail) is in effect.
fn official_reference(product: &Product) -> Option<f64> {
    let reference = if pricing::local_discount(product).is_some() {
        product.prices.official_ref_discount
    } else {
        product.prices.official_ref
    };
    reference.filter(|r| *r > 0.0)
}

fn line_equivalence_usd(product: &Product, qty: u32, line_bs: f64, rate: f64) -> f64 {
    if let Some(reference) = official_reference(product) {
        return reference * qty as f64;
    }
    if rate > 0.0 {
        line_bs / rate
    } else {
        0.0
    }
}
