use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::info;

use crate::domain::value_objects::{Address, AddressInput};
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::{Result, ShopError};

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/addresses", get(get_address).post(save_address))
}

async fn save_address(
    State(s): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = input.normalize()?;
    s.addresses().save(user_id, &address).await?;
    info!(%user_id, "Address saved");
    Ok((StatusCode::CREATED, Json(address)))
}

async fn get_address(State(s): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<Address>> {
    s.addresses()
        .find(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ShopError::NotFound("address".into()))
}
