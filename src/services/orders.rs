//! Order placement, history and status changes.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::order_builder::{CreateOrderRequest, OrderBuilder};
use crate::domain::value_objects::{AddressInput, Quantity};
use crate::messaging::EventPublisher;
use crate::services::views::{index_products, OrderView};
use crate::store::{CartStore, Catalog, OrderRepository, UserStore};
use crate::{Result, ShopError};

pub struct OrderService<'a> {
    catalog: &'a dyn Catalog,
    orders: &'a dyn OrderRepository,
    users: &'a dyn UserStore,
    carts: &'a dyn CartStore,
    events: &'a EventPublisher,
}

impl<'a> OrderService<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        orders: &'a dyn OrderRepository,
        users: &'a dyn UserStore,
        carts: &'a dyn CartStore,
        events: &'a EventPublisher,
    ) -> Self {
        Self { catalog, orders, users, carts, events }
    }

    /// Validates, prices and persists an order. Nothing is written if validation fails.
    #[instrument(skip(self, request))]
    pub async fn create_order(&self, user_id: Uuid, request: CreateOrderRequest) -> Result<OrderView> {
        let mut order = OrderBuilder::new(self.catalog).build(user_id, request).await?;
        self.orders.save(&order).await?;
        info!(order_id = %order.id(), total = %order.total(), lines = order.items().len(), "Order placed");

        self.events.publish_all(order.take_events()).await;
        self.resolve_one(&order).await
    }

    /// Places an order for everything in the user's cart, then takes the ordered
    /// quantities out of the cart.
    ///
    /// Line prices are taken from the catalog at checkout, not from the cart. Items added
    /// while the order was being placed stay in the cart.
    #[instrument(skip(self, address))]
    pub async fn checkout_cart(&self, user_id: Uuid, address: Option<AddressInput>) -> Result<OrderView> {
        let cart = self.carts.get_or_create(user_id).await?;
        if cart.is_empty() {
            return Err(ShopError::invalid_input("cart", "cart is empty"));
        }
        let ordered: Vec<(Uuid, Quantity)> = cart.items().iter().map(|i| (i.product_id, i.quantity)).collect();
        let request = CreateOrderRequest::from_lines(ordered.iter().copied(), cart.subtotal(), address);
        let view = self.create_order(user_id, request).await?;

        // The order is durable at this point; a stale cart is recoverable by the user.
        if let Err(e) = self.carts.deduct_items(user_id, &ordered).await {
            warn!(error = %e, order_id = %view.id, "Order placed but cart could not be updated");
        }
        Ok(view)
    }

    /// The user's orders, newest first, joined with current product details.
    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>> {
        let orders = self.orders.find_by_user(user_id).await?;
        let mut ids: Vec<Uuid> = orders.iter().flat_map(|o| o.items().iter().map(|i| i.product_id)).collect();
        ids.sort_unstable();
        ids.dedup();
        let products = index_products(self.catalog.find_many(&ids).await?);
        let user = self.users.find_by_id(user_id).await?;
        Ok(orders.iter().map(|o| OrderView::resolve(o, &products, user.as_ref())).collect())
    }

    /// Applies a status transition on behalf of an operator.
    ///
    /// Fails with [`ShopError::Conflict`] when another transition was stored since the
    /// order was read.
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: Uuid, next: OrderStatus) -> Result<OrderView> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("order {order_id}")))?;

        let previous = order.transition_to(next)?;
        if !self.orders.update_status(&order, previous).await? {
            return Err(ShopError::Conflict(format!("order {order_id} changed status concurrently")));
        }
        info!(%order_id, from = %previous, to = %next, "Order status changed");

        self.events.publish_all(order.take_events()).await;
        self.resolve_one(&order).await
    }

    async fn resolve_one(&self, order: &Order) -> Result<OrderView> {
        let ids: Vec<Uuid> = order.items().iter().map(|i| i.product_id).collect();
        let products = index_products(self.catalog.find_many(&ids).await?);
        let user = self.users.find_by_id(order.user_id()).await?;
        Ok(OrderView::resolve(order, &products, user.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewUser, Product};
    use crate::domain::value_objects::Money;
    use crate::store::memory::MemoryStore;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn donut(name: &str, cents: i64) -> Product {
        Product::create(name, Money::new(Decimal::new(cents, 2)).unwrap())
    }

    fn address() -> AddressInput {
        serde_json::from_value(json!({
            "street": "Rua A", "number": "10", "neighborhood": "Centro", "city": "X", "state": "Y", "cep": "00000"
        }))
        .unwrap()
    }

    fn service<'a>(store: &'a MemoryStore, events: &'a EventPublisher) -> OrderService<'a> {
        OrderService::new(store, store, store, store, events)
    }

    async fn user(store: &MemoryStore) -> Uuid {
        let new = NewUser { name: "Ana".into(), email: "ana@example.com".into(), password_hash: "x".into() };
        UserStore::create(store, new).await.unwrap().id
    }

    #[tokio::test]
    async fn test_create_order_resolves_view() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let user_id = user(&store).await;

        let request = serde_json::from_value(json!({
            "lineItems": [{ "productId": chocolate.id, "quantity": 2 }],
            "total": 1,
            "address": { "rua": "Rua A", "numero": "10", "bairro": "Centro", "cidade": "X", "estado": "Y", "cep": "00000" }
        }))
        .unwrap();
        let view = service(&store, &events).create_order(user_id, request).await.unwrap();

        assert_eq!(view.total.amount(), Decimal::new(1198, 2));
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.user.as_ref().unwrap().email, "ana@example.com");
        assert_eq!(view.items[0].product.as_ref().unwrap().name, "Donut Chocolate");
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_persists_nothing() {
        let store = MemoryStore::new();
        let events = EventPublisher::disabled();
        let request = serde_json::from_value(json!({
            "lineItems": [{ "productId": Uuid::now_v7(), "quantity": 1 }],
            "total": 5.99,
            "address": { "street": "Rua A", "number": "10", "neighborhood": "Centro", "city": "X", "state": "Y", "cep": "00000" }
        }))
        .unwrap();
        let result = service(&store, &events).create_order(Uuid::now_v7(), request).await;
        assert!(matches!(result, Err(ShopError::ProductNotFound(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_checkout_cart_clears_cart() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let user_id = user(&store).await;
        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(2).unwrap(), chocolate.price).await.unwrap();

        let view = service(&store, &events).checkout_cart(user_id, Some(address())).await.unwrap();
        assert_eq!(view.total.amount(), Decimal::new(1198, 2));
        assert_eq!(view.status, OrderStatus::Pending);
        assert!(CartStore::get_or_create(&store, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_keeps_items_added_after_read() {
        let chocolate = donut("Donut Chocolate", 599);
        let morango = donut("Donut Morango", 699);
        let store = MemoryStore::with_products([chocolate.clone(), morango.clone()]);
        let user_id = user(&store).await;
        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(2).unwrap(), chocolate.price).await.unwrap();

        // Lines read at checkout, then a concurrent add lands before the cart is updated.
        let ordered = [(chocolate.id, Quantity::new(2).unwrap())];
        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(1).unwrap(), chocolate.price).await.unwrap();
        CartStore::add_item(&store, user_id, morango.id, Quantity::new(1).unwrap(), morango.price).await.unwrap();
        let cart = CartStore::deduct_items(&store, user_id, &ordered).await.unwrap();

        let left: Vec<(Uuid, u32)> = cart.items().iter().map(|i| (i.product_id, i.quantity.value())).collect();
        assert_eq!(left, vec![(chocolate.id, 1), (morango.id, 1)]);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart_and_keeps_cart_on_bad_address() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let orders = service(&store, &events);
        let user_id = user(&store).await;

        let empty = orders.checkout_cart(user_id, Some(address())).await;
        assert!(matches!(empty, Err(ShopError::InvalidInput { ref field, .. }) if field == "cart"));

        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(1).unwrap(), chocolate.price).await.unwrap();
        let no_address = orders.checkout_cart(user_id, None).await;
        assert!(matches!(no_address, Err(ShopError::InvalidAddress(_))));
        assert_eq!(CartStore::get_or_create(&store, user_id).await.unwrap().items().len(), 1);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_orders_for_user_newest_first() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let orders = service(&store, &events);
        let user_id = user(&store).await;

        let mut placed = Vec::new();
        for quantity in 1..=3 {
            let request = serde_json::from_value(json!({
                "lineItems": [{ "productId": chocolate.id, "quantity": quantity }],
                "total": 5.99,
                "address": { "street": "Rua A", "number": "10", "neighborhood": "Centro", "city": "X", "state": "Y", "cep": "00000" }
            }))
            .unwrap();
            placed.push(orders.create_order(user_id, request).await.unwrap().id);
        }

        let history: Vec<Uuid> = orders.orders_for_user(user_id).await.unwrap().iter().map(|o| o.id).collect();
        placed.reverse();
        assert_eq!(history, placed);
        assert!(orders.orders_for_user(Uuid::now_v7()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let orders = service(&store, &events);
        let user_id = user(&store).await;
        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(1).unwrap(), chocolate.price).await.unwrap();
        let order_id = orders.checkout_cart(user_id, Some(address())).await.unwrap().id;

        let view = orders.update_status(order_id, OrderStatus::InProgress).await.unwrap();
        assert_eq!(view.status, OrderStatus::InProgress);
        let view = orders.update_status(order_id, OrderStatus::Completed).await.unwrap();
        assert_eq!(view.status, OrderStatus::Completed);

        let reopen = orders.update_status(order_id, OrderStatus::Pending).await;
        assert!(matches!(
            reopen,
            Err(ShopError::InvalidStatusTransition { from: OrderStatus::Completed, to: OrderStatus::Pending })
        ));
        assert!(matches!(orders.update_status(Uuid::now_v7(), OrderStatus::Cancelled).await, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_status_write_conflicts() {
        let chocolate = donut("Donut Chocolate", 599);
        let store = MemoryStore::with_products([chocolate.clone()]);
        let events = EventPublisher::disabled();
        let orders = service(&store, &events);
        let user_id = user(&store).await;
        CartStore::add_item(&store, user_id, chocolate.id, Quantity::new(1).unwrap(), chocolate.price).await.unwrap();
        let order_id = orders.checkout_cart(user_id, Some(address())).await.unwrap().id;

        let mut stale = OrderRepository::find_by_id(&store, order_id).await.unwrap().unwrap();
        orders.update_status(order_id, OrderStatus::Cancelled).await.unwrap();

        let previous = stale.transition_to(OrderStatus::InProgress).unwrap();
        assert!(!OrderRepository::update_status(&store, &stale, previous).await.unwrap());
    }
}
