//! Auth gate.
//!
//! Resolves `Authorization: Bearer <token>` into the caller's user id. Handlers
//! downstream only ever see the id, never the token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::services::auth::AuthError;
use crate::state::AppState;
use crate::ShopError;

/// Extractor that requires a valid bearer token.
///
/// Missing token → 401, invalid or expired token → 403.
///
/// ```rust,ignore
/// async fn handler(AuthUser(user_id): AuthUser) -> String {
///     format!("hello {user_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let state = AppState::from_ref(state);
        let user_id = state.auth().verify(token)?;
        Ok(Self(user_id))
    }
}

/// Second whitespace-separated part of the header, whatever the scheme word.
fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}
