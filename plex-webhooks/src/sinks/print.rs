use async_trait::async_trait;

use tracing::info;

use crate::api::WebhookError;
use crate::event::NormalizedEvent;
use crate::sinks::Event;

pub struct PrintSink {}

#[async_trait]
impl Event for PrintSink {
    async fn publish(&self, event_type: &str, event: NormalizedEvent) -> Result<(), WebhookError> {
        info!("{event_type} event: {event:?}");

        Ok(())
    }
}
