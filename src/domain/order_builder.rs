//! Turns a checkout request into a priced, validated [`Order`].
//!
//! Checks run in a fixed order and all of them finish before anything is written:
//!
//! 1. line items present and well formed
//! 2. client total present and positive
//! 3. address normalizes with every required field
//! 4. per line: quantity at least 1, product exists in the catalog
//! 5. total re-derived from catalog prices
//!
//! The client total is never persisted. The order always carries the catalog-derived
//! total; a client total that disagrees is only logged.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderLineItem};
use crate::domain::value_objects::{Address, AddressInput, Money, Quantity};
use crate::services::views::index_products;
use crate::store::Catalog;
use crate::{Result, ShopError};

/// Largest gap between client and server totals that is not worth a warning.
const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Checkout request body.
///
/// `lineItems` and `total` stay raw JSON until [`OrderBuilder::build`] so that a value of
/// the wrong type is reported against its own field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, alias = "products")]
    pub line_items: Option<Value>,
    #[serde(default)]
    pub total: Option<Value>,
    #[serde(default)]
    pub address: Option<AddressInput>,
}

impl CreateOrderRequest {
    pub fn from_lines(
        lines: impl IntoIterator<Item = (Uuid, Quantity)>,
        total: Money,
        address: Option<AddressInput>,
    ) -> Self {
        let line_items = lines
            .into_iter()
            .map(|(product_id, quantity)| json!({ "productId": product_id.to_string(), "quantity": quantity.value() }))
            .collect();
        Self {
            line_items: Some(Value::Array(line_items)),
            total: Some(Value::String(total.amount().to_string())),
            address,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemRequest {
    #[serde(default, alias = "product")]
    product_id: Option<Uuid>,
    #[serde(default)]
    quantity: Option<i64>,
}

/// Request that passed the structural checks (steps 1 to 3).
struct CheckoutDraft {
    lines: Vec<(Uuid, i64)>,
    client_total: Decimal,
    address: Address,
}

impl CheckoutDraft {
    fn validate(request: CreateOrderRequest) -> Result<Self> {
        let items = match request.line_items {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ShopError::invalid_input("lineItems", "line items must be a list")),
            None => vec![],
        };
        if items.is_empty() {
            return Err(ShopError::invalid_input("lineItems", "at least one line item is required"));
        }
        let lines = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let item: LineItemRequest = serde_json::from_value(item).map_err(|e| {
                    ShopError::invalid_input(format!("lineItems[{index}]"), format!("malformed line item: {e}"))
                })?;
                match (item.product_id, item.quantity) {
                    (Some(product_id), Some(quantity)) => Ok((product_id, quantity)),
                    (None, _) => Err(ShopError::invalid_input(format!("lineItems[{index}].productId"), "product id is required")),
                    (_, None) => Err(ShopError::invalid_input(format!("lineItems[{index}].quantity"), "quantity is required")),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let client_total = match request.total.as_ref().and_then(parse_amount) {
            Some(total) if total > Decimal::ZERO => total,
            _ => return Err(ShopError::invalid_input("total", "total must be a positive number")),
        };

        let address = request.address.unwrap_or_default().normalize()?;

        Ok(Self { lines, client_total, address })
    }
}

/// A JSON number, or a string holding one.
fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

pub struct OrderBuilder<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> OrderBuilder<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self { Self { catalog } }

    /// Validates and prices `request` for `user_id`. Writes nothing.
    pub async fn build(&self, user_id: Uuid, request: CreateOrderRequest) -> Result<Order> {
        let draft = CheckoutDraft::validate(request)?;

        let ids: Vec<Uuid> = draft.lines.iter().map(|(id, _)| *id).collect();
        let products = index_products(self.catalog.find_many(&ids).await?);

        let mut items = Vec::with_capacity(draft.lines.len());
        for (index, (product_id, quantity)) in draft.lines.into_iter().enumerate() {
            let quantity = Quantity::new(quantity)
                .map_err(|e| ShopError::invalid_quantity(format!("lineItems[{index}].quantity"), &e))?;
            let product = products.get(&product_id).ok_or(ShopError::ProductNotFound(product_id))?;
            items.push(OrderLineItem { product_id, quantity, unit_price: product.price });
        }

        let order = Order::place(user_id, items, draft.address)?;
        if (order.total().amount() - draft.client_total).abs() > TOTAL_TOLERANCE {
            warn!(
                %user_id,
                client_total = %draft.client_total,
                server_total = %order.total(),
                "Client total disagrees with catalog prices, using catalog total"
            );
        }
        Ok(order)
    }
}
