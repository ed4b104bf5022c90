//! Domain models

pub mod cart;
pub mod product;
