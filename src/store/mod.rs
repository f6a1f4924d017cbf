//! Persistence ports and their backends.
//!
//! Every trait here is implemented by [`postgres::PgStore`] for production and by
//! [`memory::MemoryStore`] for tests and local experiments. Each method is a single
//! atomic unit of work on the backing store.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, ContactMessage, NewUser, Order, OrderStatus, Product, User};
use crate::domain::value_objects::{Address, Money, Quantity};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only product lookup.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// All products, ordered by name.
    async fn list_all(&self) -> StoreResult<Vec<Product>>;
    /// Products among `ids` that exist. Order is unspecified.
    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_or_create(&self, user_id: Uuid) -> StoreResult<Cart>;
    /// Inserts the line or atomically increments the existing one.
    async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity, unit_price: Money) -> StoreResult<Cart>;
    /// `None` when the cart has no line for `product_id`.
    async fn update_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Option<Cart>>;
    /// `None` when the cart has no line for `product_id`.
    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>>;
    async fn clear(&self, user_id: Uuid) -> StoreResult<Cart>;
    /// Takes ordered quantities out of the cart. Lines added or increased since the
    /// cart was read keep the difference.
    async fn deduct_items(&self, user_id: Uuid, lines: &[(Uuid, Quantity)]) -> StoreResult<Cart>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts the order together with its lines.
    async fn save(&self, order: &Order) -> StoreResult<()>;
    /// Orders of `user_id`, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>>;
    /// Writes the order's current status if the stored one is still `previous`.
    /// Returns `false` when another writer got there first.
    async fn update_status(&self, order: &Order, previous: OrderStatus) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}

/// One saved delivery address per user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Replaces any address already saved for the user.
    async fn save(&self, user_id: Uuid, address: &Address) -> StoreResult<()>;
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<Address>>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn save(&self, message: &ContactMessage) -> StoreResult<()>;
}
