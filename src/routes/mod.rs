//! HTTP surface. Everything except `/health` lives under `/api`.

mod addresses;
mod auth;
mod cart;
mod contact;
mod orders;
mod products;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(products::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(addresses::routes())
        .merge(contact::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "donut-shop" }))
}
