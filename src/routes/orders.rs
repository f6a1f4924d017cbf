use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use crate::domain::order_builder::CreateOrderRequest;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::services::views::OrderView;
use crate::state::AppState;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/my-orders", get(my_orders))
}

async fn create_order(
    State(s): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(r): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let order = s.order_service().create_order(user_id, r).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn my_orders(State(s): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Vec<OrderView>>> {
    Ok(Json(s.order_service().orders_for_user(user_id).await?))
}
