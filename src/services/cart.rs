//! Cart operations for the authenticated user.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Quantity;
use crate::services::views::{index_products, CartView};
use crate::store::{CartStore, Catalog};
use crate::{Result, ShopError};

pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    catalog: &'a dyn Catalog,
}

impl<'a> CartService<'a> {
    pub fn new(carts: &'a dyn CartStore, catalog: &'a dyn Catalog) -> Self {
        Self { carts, catalog }
    }

    /// The user's cart, created empty on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<CartView> {
        let cart = self.carts.get_or_create(user_id).await?;
        self.view(&cart).await
    }

    /// Adds `quantity` of a product at its current catalog price.
    ///
    /// A product already in the cart has its quantity incremented and its unit price
    /// refreshed; no second line is created.
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<CartView> {
        let quantity = Quantity::new(quantity).map_err(|e| ShopError::invalid_quantity("quantity", &e))?;
        let product = self
            .catalog
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("product {product_id}")))?;

        let cart = self.carts.add_item(user_id, product_id, quantity, product.price).await?;
        info!(%product_id, %quantity, "Item added to cart");
        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<CartView> {
        let quantity = Quantity::new(quantity).map_err(|e| ShopError::invalid_quantity("quantity", &e))?;
        let cart = self
            .carts
            .update_quantity(user_id, product_id, quantity)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("cart item {product_id}")))?;
        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView> {
        let cart = self
            .carts
            .remove_item(user_id, product_id)
            .await?
            .ok_or_else(|| ShopError::NotFound(format!("cart item {product_id}")))?;
        self.view(&cart).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<CartView> {
        let cart = self.carts.clear(user_id).await?;
        self.view(&cart).await
    }

    async fn view(&self, cart: &Cart) -> Result<CartView> {
        let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product_id).collect();
        let products = index_products(self.catalog.find_many(&ids).await?);
        Ok(CartView::resolve(cart, &products))
    }
}
