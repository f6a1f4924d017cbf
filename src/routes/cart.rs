use axum::{extract::State, http::StatusCode, routing::{get, patch, post}, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::value_objects::AddressInput;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::services::views::{CartView, OrderView};
use crate::state::AppState;
use crate::{Result, ShopError};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:productId", patch(update_quantity).delete(remove_item))
        .route("/cart/checkout", post(checkout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(default, alias = "product")]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub address: Option<AddressInput>,
}

async fn get_cart(State(s): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<CartView>> {
    Ok(Json(s.cart_service().get_or_create(user_id).await?))
}

async fn add_item(State(s): State<AppState>, AuthUser(user_id): AuthUser, ApiJson(r): ApiJson<AddItemRequest>) -> Result<Json<CartView>> {
    let product_id = r.product_id.ok_or_else(|| ShopError::invalid_input("productId", "product id is required"))?;
    Ok(Json(s.cart_service().add_item(user_id, product_id, r.quantity.unwrap_or(1)).await?))
}

async fn update_quantity(
    State(s): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiJson(r): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let quantity = r.quantity.ok_or_else(|| ShopError::invalid_input("quantity", "quantity is required"))?;
    Ok(Json(s.cart_service().update_quantity(user_id, product_id, quantity).await?))
}

async fn remove_item(State(s): State<AppState>, AuthUser(user_id): AuthUser, ApiPath(product_id): ApiPath<Uuid>) -> Result<Json<CartView>> {
    Ok(Json(s.cart_service().remove_item(user_id, product_id).await?))
}

async fn clear_cart(State(s): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<CartView>> {
    Ok(Json(s.cart_service().clear(user_id).await?))
}

async fn checkout(
    State(s): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(r): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let order = s.order_service().checkout_cart(user_id, r.address).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
