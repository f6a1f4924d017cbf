//! HTTP mapping of [`ShopError`].
//!
//! Every rejection is a JSON body of the form
//! `{"error": <code>, "message": <text>, ...detail}` so clients can correct the
//! request. Server-side failures are logged here and reported with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::ShopError;

impl ShopError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidAddress(_)
            | Self::ProductNotFound(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) | Self::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InvalidAddress(_) => "invalid_address",
            Self::ProductNotFound(_) => "product_not_found",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::Persistence(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({ "error": self.code() });
        let detail = match self {
            // Don't expose internal error details to clients
            Self::Persistence(_) | Self::Internal(_) => json!({ "message": "Internal server error" }),
            Self::InvalidInput { field, .. } => json!({ "message": self.to_string(), "field": field }),
            Self::InvalidQuantity { field, value } => json!({ "message": self.to_string(), "field": field, "value": value }),
            Self::InvalidAddress(e) => json!({ "message": self.to_string(), "missing": e.missing() }),
            Self::ProductNotFound(id) => json!({ "message": self.to_string(), "productId": id }),
            Self::InvalidStatusTransition { from, to } => json!({ "message": self.to_string(), "from": from, "to": to }),
            _ => json!({ "message": self.to_string() }),
        };
        if let (Some(body), Value::Object(detail)) = (body.as_object_mut(), detail) {
            body.extend(detail);
        }
        body
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::AddressError;
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::invalid_input("total", "must be positive").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ShopError::ProductNotFound(Uuid::nil()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ShopError::NotFound("cart item".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ShopError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ShopError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ShopError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ShopError::Persistence(StoreError::Corrupt("bad row".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_carries_detail() {
        let body = ShopError::InvalidQuantity { field: "quantity".into(), value: 0 }.body();
        assert_eq!(body["error"], "invalid_quantity");
        assert_eq!(body["field"], "quantity");
        assert_eq!(body["value"], 0);

        let body = ShopError::from(AddressError::MissingFields(vec!["cep", "city"])).body();
        assert_eq!(body["missing"], json!(["cep", "city"]));
    }

    #[test]
    fn test_internal_details_hidden() {
        let body = ShopError::Persistence(StoreError::Corrupt("order 1 has unknown status".into())).body();
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "internal_error");
    }
}
