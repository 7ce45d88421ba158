//! Canonical product schema.
//!
//! Every product carries a colour-keyed stock map. Older documents that store
//! a flat `stock: {color: count}` map are converted into this shape at the
//! store-read boundary, so nothing past that point sees the legacy form.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::id::ProductId;
use super::price::Price;

/// Maximum number of images a product may carry.
pub const MAX_PRODUCT_IMAGES: usize = 3;

/// Stock counters for one colour of a product.
///
/// `reserved` never exceeds `stock`; the constructor clamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorStock {
    /// CSS colour used for the swatch (e.g. `#ff6b6b`).
    pub code: String,
    stock: u32,
    #[serde(default)]
    reserved: u32,
}

impl ColorStock {
    /// Create stock counters, clamping `reserved` to `stock`.
    #[must_use]
    pub fn new(code: impl Into<String>, stock: u32, reserved: u32) -> Self {
        Self {
            code: code.into(),
            stock,
            reserved: reserved.min(stock),
        }
    }

    /// Units on hand according to the catalog.
    #[must_use]
    pub const fn stock(&self) -> u32 {
        self.stock
    }

    /// Units already reserved by other writers.
    #[must_use]
    pub const fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Units not held by any recorded reservation.
    #[must_use]
    pub const fn unreserved(&self) -> u32 {
        self.stock.saturating_sub(self.reserved)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    pub category: Category,
    /// One to three image URLs; the first is the default display image.
    pub images: Vec<String>,
    pub colors: BTreeMap<String, ColorStock>,
    pub active: bool,
}

impl Product {
    /// The image shown in listings and cart lines.
    #[must_use]
    pub fn default_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Look up a colour by its exact name.
    #[must_use]
    pub fn color(&self, name: &str) -> Option<&ColorStock> {
        self.colors.get(name)
    }

    /// Unit price with currency.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::brl(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_is_clamped_to_stock() {
        let color = ColorStock::new("#000", 3, 10);
        assert_eq!(color.reserved(), 3);
        assert_eq!(color.unreserved(), 0);
    }

    #[test]
    fn test_unreserved_subtracts_reservations() {
        let color = ColorStock::new("#000", 8, 3);
        assert_eq!(color.unreserved(), 5);
    }

    #[test]
    fn test_default_image_is_first() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Top X".to_owned(),
            price: Decimal::new(15, 0),
            category: Category::Tops,
            images: vec!["a.jpg".to_owned(), "b.jpg".to_owned()],
            colors: BTreeMap::new(),
            active: true,
        };
        assert_eq!(product.default_image(), Some("a.jpg"));
        assert!(product.color("Rosa").is_none());
    }
}
