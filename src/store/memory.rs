//! In-memory backend. Every operation holds the single lock for its whole duration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AddressStore, Catalog, CartStore, ContactStore, OrderRepository, StoreError, StoreResult, UserStore};
use crate::domain::aggregates::{Cart, ContactMessage, NewUser, Order, OrderStatus, Product, User};
use crate::domain::value_objects::{Address, Money, Quantity};

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    orders: Vec<Order>,
    users: HashMap<Uuid, User>,
    addresses: HashMap<Uuid, Address>,
    contacts: Vec<ContactMessage>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self { inner: RwLock::new(Inner { products, ..Inner::default() }) }
    }

    pub async fn order_count(&self) -> usize { self.inner.read().await.orders.len() }

    pub async fn contact_messages(&self) -> Vec<ContactMessage> { self.inner.read().await.contacts.clone() }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.inner.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.products.get(id).cloned()).collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_or_create(&self, user_id: Uuid) -> StoreResult<Cart> {
        let mut inner = self.inner.write().await;
        Ok(inner.carts.entry(user_id).or_insert_with(|| Cart::for_user(user_id)).clone())
    }

    async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity, unit_price: Money) -> StoreResult<Cart> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.entry(user_id).or_insert_with(|| Cart::for_user(user_id));
        cart.add_item(product_id, quantity, unit_price);
        Ok(cart.clone())
    }

    async fn update_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Option<Cart>> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&user_id) else { return Ok(None) };
        Ok(cart.update_quantity(product_id, quantity).ok().map(|()| cart.clone()))
    }

    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&user_id) else { return Ok(None) };
        Ok(cart.remove_item(product_id).ok().map(|_| cart.clone()))
    }

    async fn clear(&self, user_id: Uuid) -> StoreResult<Cart> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.entry(user_id).or_insert_with(|| Cart::for_user(user_id));
        cart.clear();
        Ok(cart.clone())
    }

    async fn deduct_items(&self, user_id: Uuid, lines: &[(Uuid, Quantity)]) -> StoreResult<Cart> {
        let mut inner = self.inner.write().await;
        let cart = inner.carts.entry(user_id).or_insert_with(|| Cart::for_user(user_id));
        for (product_id, quantity) in lines {
            cart.deduct(*product_id, *quantity);
        }
        Ok(cart.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn save(&self, order: &Order) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.iter().any(|o| o.id() == order.id()) {
            return Err(StoreError::Duplicate(format!("order {}", order.id())));
        }
        let mut stored = order.clone();
        stored.take_events();
        inner.orders.push(stored);
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner.orders.iter().rev().filter(|o| o.user_id() == user_id).cloned().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.inner.read().await.orders.iter().find(|o| o.id() == id).cloned())
    }

    async fn update_status(&self, order: &Order, previous: OrderStatus) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.orders.iter_mut().find(|o| o.id() == order.id()) else { return Ok(false) };
        if stored.status() != previous { return Ok(false); }
        let mut updated = order.clone();
        updated.take_events();
        *stored = updated;
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("user with email {}", user.email)));
        }
        let user = user.into_user();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn save(&self, user_id: Uuid, address: &Address) -> StoreResult<()> {
        self.inner.write().await.addresses.insert(user_id, address.clone());
        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> StoreResult<Option<Address>> {
        Ok(self.inner.read().await.addresses.get(&user_id).cloned())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn save(&self, message: &ContactMessage) -> StoreResult<()> {
        self.inner.write().await.contacts.push(message.clone());
        Ok(())
    }
}
