//! Display shapes returned to clients: carts and orders joined with product and user details.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, OrderStatus, Product, User};
use crate::domain::value_objects::{Address, Money, Quantity};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
    pub image: String,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self { id: p.id, name: p.name.clone(), price: p.price, image: p.image.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self { id: u.id, name: u.name, email: u.email, created_at: u.created_at }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub product_id: Uuid,
    /// `None` when the product is no longer in the catalog.
    pub product: Option<ProductSummary>,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user_id: Uuid,
    pub items: Vec<LineView>,
    pub item_count: u64,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub items: Vec<LineView>,
    pub total: Money,
    pub address: Address,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Products keyed by id, for joining lines.
pub(crate) type ProductIndex = HashMap<Uuid, Product>;

pub(crate) fn index_products(products: Vec<Product>) -> ProductIndex {
    products.into_iter().map(|p| (p.id, p)).collect()
}

fn line(products: &ProductIndex, product_id: Uuid, quantity: Quantity, unit_price: Money) -> LineView {
    LineView {
        product_id,
        product: products.get(&product_id).map(ProductSummary::from),
        quantity,
        unit_price,
        line_total: unit_price.multiply(quantity),
    }
}

impl CartView {
    pub(crate) fn resolve(cart: &Cart, products: &ProductIndex) -> Self {
        Self {
            user_id: cart.user_id(),
            items: cart.items().iter().map(|i| line(products, i.product_id, i.quantity, i.unit_price)).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
            created_at: cart.created_at(),
            updated_at: cart.updated_at(),
        }
    }
}

impl OrderView {
    pub(crate) fn resolve(order: &Order, products: &ProductIndex, user: Option<&User>) -> Self {
        Self {
            id: order.id(),
            user: user.map(UserSummary::from),
            items: order.items().iter().map(|i| line(products, i.product_id, i.quantity, i.unit_price)).collect(),
            total: order.total(),
            address: order.address().clone(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}
