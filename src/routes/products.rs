use axum::{extract::State, routing::get, Json, Router};
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::extract::ApiPath;
use crate::state::AppState;
use crate::{Result, ShopError};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

async fn list_products(State(s): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.catalog().list_all().await?))
}

async fn get_product(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<Product>> {
    s.catalog()
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ShopError::NotFound(format!("product {id}")))
}
