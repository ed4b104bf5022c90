//! Text folding for product search
//!
//! Accent- and case-insensitive matching: NFD decomposition, combining
//! marks stripped, lowercased, trimmed.

use unicode_normalization::UnicodeNormalization;

/// Fold a string for search comparison.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}
