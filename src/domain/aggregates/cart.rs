//! Cart Aggregate

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{Money, Quantity};

/// A user's pre-checkout basket. One per user, keyed by the user id.
#[derive(Clone, Debug)]
pub struct Cart {
    user_id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self { user_id, items: vec![], created_at: now, updated_at: now }
    }

    /// Rebuild a cart from stored parts.
    pub fn restore(user_id: Uuid, items: Vec<CartItem>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self { user_id, items, created_at, updated_at }
    }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item_count(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity.value())).sum() }
    pub fn subtotal(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }

    /// Adds a line, or increments the existing line for the same product.
    ///
    /// Either way the line takes `unit_price`, the catalog price at the time of the call.
    pub fn add_item(&mut self, product_id: Uuid, quantity: Quantity, unit_price: Money) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.add(quantity);
            existing.unit_price = unit_price;
        } else {
            self.items.push(CartItem { product_id, quantity, unit_price });
        }
        self.touch();
    }

    pub fn update_quantity(&mut self, product_id: Uuid, quantity: Quantity) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound(product_id))?;
        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<CartItem, CartError> {
        let index = self.items.iter().position(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound(product_id))?;
        let removed = self.items.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Takes `quantity` of a product out of the cart, dropping the line when nothing is left.
    /// Absent products are ignored.
    pub fn deduct(&mut self, product_id: Uuid, quantity: Quantity) {
        if let Some(index) = self.items.iter().position(|i| i.product_id == product_id) {
            match self.items[index].quantity.checked_sub(quantity) {
                Some(left) => self.items[index].quantity = left,
                None => { self.items.remove(index); }
            }
            self.touch();
        }
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {0} is not in the cart")]
    ItemNotFound(Uuid),
}
