//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::value_objects::Money;

/// Catalog entry. Read-only from the cart and order perspective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn create(name: impl Into<String>, price: Money) -> Self {
        Self {
            id: Uuid::now_v7(), name: name.into(), description: String::new(),
            price, image: String::new(), created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_image(mut self, image: impl Into<String>) -> Self { self.image = image.into(); self }
}
