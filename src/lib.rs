//! Donut Shop Backend
//!
//! HTTP/JSON backend for a small donut shop.
//!
//! ## Features
//! - Product catalog
//! - Per-user shopping cart
//! - Checkout into immutable, server-priced orders
//! - Order history and status lifecycle
//! - Accounts, saved addresses and a contact form

pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod messaging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{OrderError, OrderStatus};
use crate::domain::value_objects::{AddressError, QuantityError};
use crate::services::auth::AuthError;
use crate::store::StoreError;

pub use routes::router;
pub use state::AppState;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("invalid quantity for {field}: {value}")]
    InvalidQuantity { field: String, value: i64 },

    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error("product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ShopError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), message: message.into() }
    }

    pub fn invalid_quantity(field: impl Into<String>, error: &QuantityError) -> Self {
        Self::InvalidQuantity { field: field.into(), value: error.value() }
    }
}

impl From<OrderError> for ShopError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::NoItems => Self::invalid_input("lineItems", "at least one line item is required"),
            OrderError::NonPositiveTotal(total) => Self::invalid_input("total", format!("order total must be positive, computed {total}")),
            OrderError::InvalidTransition { from, to } => Self::InvalidStatusTransition { from, to },
        }
    }
}

impl From<AuthError> for ShopError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingToken => Self::Unauthorized("missing bearer token".into()),
            AuthError::InvalidToken(_) => Self::Forbidden("invalid or expired token".into()),
            AuthError::InvalidCredentials => Self::Unauthorized("invalid email or password".into()),
            AuthError::PasswordHash | AuthError::TokenIssue(_) => Self::Internal(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        match fields.first() {
            Some((field, field_errors)) => {
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map_or_else(|| "is invalid".to_string(), ToString::to_string);
                Self::invalid_input(*field, message)
            }
            None => Self::invalid_input("body", errors.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
