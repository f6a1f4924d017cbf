//! Request body and path extraction.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, RawPathParams, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::ShopError;

/// `Json` whose rejections become [`ShopError::InvalidInput`] instead of axum's plain-text 4xx.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> ShopError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ShopError::invalid_input("content-type", "expected `Content-Type: application/json`")
        }
        other => ShopError::invalid_input("body", other.body_text()),
    }
}

/// `Path` whose rejections become [`ShopError::InvalidInput`] naming the offending segment.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                let field = RawPathParams::from_request_parts(parts, state)
                    .await
                    .ok()
                    .and_then(|params| params.iter().next().map(|(key, _)| key.to_string()))
                    .unwrap_or_else(|| "path".to_string());
                Err(ShopError::invalid_input(field, rejection.body_text()))
            }
        }
    }
}
