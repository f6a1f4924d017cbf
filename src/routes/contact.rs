use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::domain::aggregates::{ContactMessage, ContactRequest};
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit))
}

async fn submit(State(s): State<AppState>, ApiJson(r): ApiJson<ContactRequest>) -> Result<(StatusCode, Json<Value>)> {
    let message = ContactMessage::from_request(r)?;
    s.contacts().save(&message).await?;
    info!(contact_id = %message.id, "Contact message received");
    Ok((StatusCode::CREATED, Json(json!({ "message": "Mensagem enviada com sucesso" }))))
}
