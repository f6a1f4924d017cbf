//! Domain event publishing over NATS.

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

const SUBJECT_PREFIX: &str = "donut_shop";

/// Publishes domain events when a NATS client is configured, otherwise drops them.
///
/// Publishing happens after the change is durable, so failures are logged and never
/// surfaced to the caller.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn disabled() -> Self { Self::default() }

    pub fn nats(client: async_nats::Client) -> Self { Self { nats: Some(client) } }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, event: &DomainEvent) {
        let Some(client) = &self.nats else {
            debug!(subject = event.subject(), "NATS disabled, event dropped");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, subject = event.subject(), "Failed to serialize event");
                return;
            }
        };
        let subject = subject_for(event);
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!(error = %e, %subject, "Failed to publish event");
        }
    }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in &events {
            self.publish(event).await;
        }
    }
}

fn subject_for(event: &DomainEvent) -> String {
    format!("{SUBJECT_PREFIX}.{}", event.subject())
}
