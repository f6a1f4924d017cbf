//! PostgreSQL backend.
//!
//! Cart writes are single statements (the add path is an upsert with an atomic
//! increment), so concurrent requests on one cart never lose an update. Orders and
//! their lines are written in one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{AddressStore, Catalog, CartStore, ContactStore, OrderRepository, StoreError, StoreResult, UserStore};
use crate::domain::aggregates::{Cart, CartItem, ContactMessage, NewUser, Order, OrderLineItem, OrderStatus, Product, User};
use crate::domain::value_objects::{Address, Money, Quantity};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[derive(sqlx::FromRow)]
struct ProductRow { id: Uuid, name: String, description: String, price: Decimal, image: String, created_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct CartRow { created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct CartItemRow { product_id: Uuid, quantity: i32, unit_price: Decimal }

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: Uuid, total: Decimal, address: Json<Address>, status: String,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow { order_id: Uuid, product_id: Uuid, quantity: i32, unit_price: Decimal }

#[derive(sqlx::FromRow)]
struct UserRow { id: Uuid, name: String, email: String, password_hash: String, created_at: DateTime<Utc> }

fn money(amount: Decimal, what: &str) -> StoreResult<Money> {
    Money::new(amount).map_err(|e| StoreError::Corrupt(format!("{what}: {e}")))
}

fn quantity(value: i32, what: &str) -> StoreResult<Quantity> {
    Quantity::new(i64::from(value)).map_err(|e| StoreError::Corrupt(format!("{what}: {e}")))
}

fn storage_quantity(quantity: Quantity) -> i32 {
    // Quantity::MAX is i32::MAX, so this never saturates.
    i32::try_from(quantity.value()).unwrap_or(i32::MAX)
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> StoreResult<Self> {
        Ok(Product { price: money(r.price, "product price")?, id: r.id, name: r.name, description: r.description, image: r.image, created_at: r.created_at })
    }
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User { id: r.id, name: r.name, email: r.email, password_hash: r.password_hash, created_at: r.created_at }
    }
}

fn order_from_rows(row: OrderRow, items: Vec<OrderItemRow>) -> StoreResult<Order> {
    let status = OrderStatus::parse(&row.status)
        .ok_or_else(|| StoreError::Corrupt(format!("order {} has unknown status {:?}", row.id, row.status)))?;
    let items = items
        .into_iter()
        .map(|i| Ok(OrderLineItem { product_id: i.product_id, quantity: quantity(i.quantity, "order line")?, unit_price: money(i.unit_price, "order line")? }))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Order::restore(row.id, row.user_id, items, money(row.total, "order total")?, row.address.0, status, row.created_at, row.updated_at))
}

async fn ensure_cart(conn: &mut PgConnection, user_id: Uuid) -> StoreResult<()> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()")
        .bind(user_id).execute(&mut *conn).await?;
    Ok(())
}

async fn load_cart(conn: &mut PgConnection, user_id: Uuid) -> StoreResult<Cart> {
    let cart = sqlx::query_as::<_, CartRow>("SELECT created_at, updated_at FROM carts WHERE user_id = $1")
        .bind(user_id).fetch_one(&mut *conn).await?;
    let items = sqlx::query_as::<_, CartItemRow>("SELECT product_id, quantity, unit_price FROM cart_items WHERE user_id = $1 ORDER BY added_seq")
        .bind(user_id).fetch_all(&mut *conn).await?
        .into_iter()
        .map(|i| Ok(CartItem { product_id: i.product_id, quantity: quantity(i.quantity, "cart line")?, unit_price: money(i.unit_price, "cart line")? }))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Cart::restore(user_id, items, cart.created_at, cart.updated_at))
}

#[async_trait]
impl Catalog for PgStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT id, name, description, price, image, created_at FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT id, name, description, price, image, created_at FROM products ORDER BY name, id")
            .fetch_all(&self.pool).await?
            .into_iter().map(Product::try_from).collect()
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        if ids.is_empty() { return Ok(vec![]); }
        sqlx::query_as::<_, ProductRow>("SELECT id, name, description, price, image, created_at FROM products WHERE id = ANY($1)")
            .bind(ids.to_vec()).fetch_all(&self.pool).await?
            .into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_or_create(&self, user_id: Uuid) -> StoreResult<Cart> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id).execute(&mut *tx).await?;
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity, unit_price: Money) -> StoreResult<Cart> {
        let mut tx = self.pool.begin().await?;
        ensure_cart(&mut tx, user_id).await?;
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, product_id) DO UPDATE \
             SET quantity = LEAST(cart_items.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER, unit_price = EXCLUDED.unit_price",
        )
        .bind(user_id).bind(product_id).bind(storage_quantity(quantity)).bind(unit_price.amount())
        .execute(&mut *tx).await?;
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn update_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> StoreResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2")
            .bind(user_id).bind(product_id).bind(storage_quantity(quantity))
            .execute(&mut *tx).await?.rows_affected();
        if updated == 0 { return Ok(None); }
        ensure_cart(&mut tx, user_id).await?;
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(Some(cart))
    }

    async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Cart>> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id).bind(product_id)
            .execute(&mut *tx).await?.rows_affected();
        if removed == 0 { return Ok(None); }
        ensure_cart(&mut tx, user_id).await?;
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(Some(cart))
    }

    async fn clear(&self, user_id: Uuid) -> StoreResult<Cart> {
        let mut tx = self.pool.begin().await?;
        ensure_cart(&mut tx, user_id).await?;
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&mut *tx).await?;
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn deduct_items(&self, user_id: Uuid, lines: &[(Uuid, Quantity)]) -> StoreResult<Cart> {
        let mut tx = self.pool.begin().await?;
        ensure_cart(&mut tx, user_id).await?;
        for (product_id, quantity) in lines {
            let quantity = storage_quantity(*quantity);
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND quantity <= $3")
                .bind(user_id).bind(product_id).bind(quantity)
                .execute(&mut *tx).await?;
            sqlx::query("UPDATE cart_items SET quantity = quantity - $3 WHERE user_id = $1 AND product_id = $2 AND quantity > $3")
                .bind(user_id).bind(product_id).bind(quantity)
                .execute(&mut *tx).await?;
        }
        let cart = load_cart(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

const ORDER_COLUMNS: &str = "id, user_id, total, address, status, created_at, updated_at";

impl PgStore {
    async fn attach_items(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        if !ids.is_empty() {
            let found = sqlx::query_as::<_, OrderItemRow>(
                "SELECT order_id, product_id, quantity, unit_price FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, line_no",
            )
            .bind(&ids).fetch_all(&self.pool).await?;
            for item in found { items.entry(item.order_id).or_default().push(item); }
        }
        rows.into_iter()
            .map(|row| { let lines = items.remove(&row.id).unwrap_or_default(); order_from_rows(row, lines) })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn save(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO orders (id, user_id, total, address, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(order.id()).bind(order.user_id()).bind(order.total().amount()).bind(Json(order.address()))
            .bind(order.status().as_str()).bind(order.created_at()).bind(order.updated_at())
            .execute(&mut *tx).await?;
        for (line_no, item) in (1_i32..).zip(order.items()) {
            sqlx::query("INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)")
                .bind(order.id()).bind(line_no).bind(item.product_id).bind(storage_quantity(item.quantity)).bind(item.unit_price.amount())
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"))
            .bind(user_id).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?;
        Ok(self.attach_items(row.into_iter().collect()).await?.pop())
    }

    async fn update_status(&self, order: &Order, previous: OrderStatus) -> StoreResult<bool> {
        let updated = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 AND status = $4")
            .bind(order.id()).bind(order.status().as_str()).bind(order.updated_at()).bind(previous.as_str())
            .execute(&self.pool).await?.rows_affected();
        Ok(updated == 1)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user();
        sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(user.id).bind(&user.name).bind(&user.email).bind(&user.password_hash).bind(user.created_at)
        .fetch_one(&self.pool).await
        .map(User::from)
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(format!("user with email {}", user.email)),
            other => StoreError::Database(other),
        })
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>("SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1")
            .bind(email).fetch_optional(&self.pool).await?
            .map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>("SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(User::from))
    }
}

#[async_trait]
impl AddressStore for PgStore {
    async fn save(&self, user_id: Uuid, address: &Address) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO addresses (user_id, address) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET address = EXCLUDED.address, updated_at = NOW()",
        )
        .bind(user_id).bind(Json(address))
        .execute(&self.pool).await?;
        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> StoreResult<Option<Address>> {
        let row: Option<(Json<Address>,)> = sqlx::query_as("SELECT address FROM addresses WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(Json(address),)| address))
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn save(&self, message: &ContactMessage) -> StoreResult<()> {
        sqlx::query("INSERT INTO contact_messages (id, name, email, phone, subject, message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(message.id).bind(&message.name).bind(&message.email).bind(&message.phone)
            .bind(&message.subject).bind(&message.message).bind(message.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }
}
