//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    #[serde(rename_all = "camelCase")]
    OrderPlaced { order_id: Uuid, user_id: Uuid, total: Money, line_count: usize, occurred_at: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus, occurred_at: DateTime<Utc> },
}

impl DomainEvent {
    /// Subject suffix the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "order.created",
            Self::OrderStatusChanged { .. } => "order.status_changed",
        }
    }
}
