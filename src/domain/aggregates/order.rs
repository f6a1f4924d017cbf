//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{Address, Money, Quantity};
use crate::domain::events::DomainEvent;

/// A placed order. Line items, total and address are frozen at creation;
/// only the status (and `updated_at` with it) moves afterwards.
#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    items: Vec<OrderLineItem>,
    total: Money,
    address: Address,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLineItem {
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "em andamento")]
    InProgress,
    #[serde(alias = "concluído", alias = "concluido")]
    Completed,
    #[serde(alias = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the stored label, accepting the legacy Portuguese ones too.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "pending" | "pendente" => Some(Self::Pending),
            "in_progress" | "em andamento" => Some(Self::InProgress),
            "completed" | "concluído" | "concluido" => Some(Self::Completed),
            "cancelled" | "cancelado" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Pending | Self::InProgress, Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Order {
    /// Creates a pending order whose total is derived from its lines.
    pub fn place(user_id: Uuid, items: Vec<OrderLineItem>, address: Address) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let total: Money = items.iter().map(OrderLineItem::line_total).sum();
        if !total.is_positive() { return Err(OrderError::NonPositiveTotal(total.amount())); }

        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(), user_id, items, total, address,
            status: OrderStatus::Pending, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::OrderPlaced {
            order_id: order.id, user_id, total, line_count: order.items.len(), occurred_at: now,
        });
        Ok(order)
    }

    /// Rebuild an order from stored parts. Raises no events.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, user_id: Uuid, items: Vec<OrderLineItem>, total: Money, address: Address,
        status: OrderStatus, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, items, total, address, status, created_at, updated_at, events: vec![] }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[OrderLineItem] { &self.items }
    pub fn total(&self) -> Money { self.total }
    pub fn address(&self) -> &Address { &self.address }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves the order to `next`, returning the status it left.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if !from.can_transition_to(next) { return Err(OrderError::InvalidTransition { from, to: next }); }
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::OrderStatusChanged { order_id: self.id, from, to: next, occurred_at: self.updated_at });
        Ok(from)
    }

    pub fn start(&mut self) -> Result<OrderStatus, OrderError> { self.transition_to(OrderStatus::InProgress) }
    pub fn complete(&mut self) -> Result<OrderStatus, OrderError> { self.transition_to(OrderStatus::Completed) }
    pub fn cancel(&mut self) -> Result<OrderStatus, OrderError> { self.transition_to(OrderStatus::Cancelled) }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("order total must be positive, computed {0}")]
    NonPositiveTotal(Decimal),
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
