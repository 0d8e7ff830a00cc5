use async_trait::async_trait;

use crate::api::WebhookError;
use crate::event::NormalizedEvent;

pub mod hass;
pub mod print;

/// Where normalized events go. `publish` hands the event over and returns
/// without waiting for any consumer to acknowledge it.
#[async_trait]
pub trait Event {
    async fn publish(&self, event_type: &str, event: NormalizedEvent) -> Result<(), WebhookError>;
}
