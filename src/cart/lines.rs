//! Cart line rules with no I/O.
//!
//! A line's quantity stays within `1..=inventory` and `(product_id, variant_id)`
//! is unique within a cart.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::CartError;
use crate::domain::{CartItem, NewCartItem};

/// Adds `item`, merging into an existing line for the same product and variant.
/// Leaves `items` untouched when the result would exceed the inventory.
pub fn add_line(items: &mut Vec<CartItem>, item: NewCartItem) -> Result<(), CartError> {
    if item.quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }

    match find_same(items, &item) {
        Some(index) => {
            let line = &mut items[index];
            let requested = line.quantity.saturating_add(item.quantity);
            if requested > line.inventory {
                return Err(CartError::InsufficientStock {
                    requested,
                    available: line.inventory,
                });
            }
            line.quantity = requested;
        }
        None => {
            if item.quantity > item.inventory {
                return Err(CartError::InsufficientStock {
                    requested: item.quantity,
                    available: item.inventory,
                });
            }
            items.push(new_line(item));
        }
    }
    Ok(())
}

/// Like [`add_line`] but clamps at the inventory instead of rejecting.
/// Returns the quantity that was dropped.
pub fn merge_line(items: &mut Vec<CartItem>, item: NewCartItem) -> u32 {
    match find_same(items, &item) {
        Some(index) => {
            let line = &mut items[index];
            let wanted = line.quantity.saturating_add(item.quantity);
            line.quantity = wanted.min(line.inventory);
            wanted - line.quantity
        }
        None => {
            let quantity = item.quantity.min(item.inventory);
            let dropped = item.quantity - quantity;
            if quantity > 0 {
                items.push(new_line(NewCartItem { quantity, ..item }));
            }
            dropped
        }
    }
}

/// Sets a line's quantity. Zero removes the line.
pub fn set_quantity(items: &mut Vec<CartItem>, id: &str, quantity: u32) -> Result<(), CartError> {
    let index = items
        .iter()
        .position(|line| line.id == id)
        .ok_or_else(|| CartError::ItemNotFound(id.to_string()))?;

    if quantity == 0 {
        items.remove(index);
        return Ok(());
    }
    let line = &mut items[index];
    if quantity > line.inventory {
        return Err(CartError::InsufficientStock {
            requested: quantity,
            available: line.inventory,
        });
    }
    line.quantity = quantity;
    Ok(())
}

/// Returns whether a line was removed.
pub fn remove_line(items: &mut Vec<CartItem>, id: &str) -> bool {
    let before = items.len();
    items.retain(|line| line.id != id);
    items.len() != before
}

/// `None` when the total does not fit in a `Decimal`.
pub fn total_price(items: &[CartItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.line_total()?))
}

pub fn total_items(items: &[CartItem]) -> u32 {
    items.iter().fold(0u32, |acc, line| acc.saturating_add(line.quantity))
}

fn find_same(items: &[CartItem], item: &NewCartItem) -> Option<usize> {
    items
        .iter()
        .position(|line| line.same_product(&item.product_id, item.variant_id.as_deref()))
}

fn new_line(item: NewCartItem) -> CartItem {
    CartItem {
        id: Uuid::new_v4().to_string(),
        product_id: item.product_id,
        variant_id: item.variant_id,
        name: item.name,
        variant_name: item.variant_name,
        price: item.price,
        image: item.image,
        quantity: item.quantity,
        inventory: item.inventory,
    }
}
