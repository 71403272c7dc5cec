use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product line in a cart.
///
/// `quantity` stays within `1..=inventory`, and a cart never holds two lines
/// with the same `(product_id, variant_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_name: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
    pub inventory: u32,
}

impl CartItem {
    pub fn same_product(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }

    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// What the storefront hands to "add to cart".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_name: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
    pub inventory: u32,
}

impl NewCartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Decimal, inventory: u32) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            name: name.into(),
            variant_name: None,
            price,
            image: None,
            quantity: 1,
            inventory,
        }
    }

    pub fn with_variant(mut self, variant_id: impl Into<String>, variant_name: impl Into<String>) -> Self {
        self.variant_id = Some(variant_id.into());
        self.variant_name = Some(variant_name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

impl From<&CartItem> for NewCartItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            name: item.name.clone(),
            variant_name: item.variant_name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity: item.quantity,
            inventory: item.inventory,
        }
    }
}

/// Server-side copy of a signed-in user's cart, keyed by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}
