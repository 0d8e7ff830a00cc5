use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, instrument, warn};

use crate::api::WebhookError;
use crate::config::HassConfig;
use crate::event::NormalizedEvent;
use crate::prometheus::report_dropped_events;
use crate::sinks::Event;

struct Delivery {
    event_type: String,
    event: NormalizedEvent,
}

/// Fires events on the Home Assistant event bus through its REST API
/// (`POST /api/events/<event_type>`).
///
/// Publishing only enqueues the event: a background task drains the bounded
/// queue and posts each event once. Failed deliveries are logged and counted,
/// never retried.
#[derive(Clone)]
pub struct HassSink {
    queue: mpsc::Sender<Delivery>,
}

pub fn build_http_client(request_timeout: Duration) -> reqwest::Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Client::builder()
        .default_headers(headers)
        .user_agent("plex-webhooks")
        .timeout(request_timeout)
        .build()
}

impl HassSink {
    pub fn new(config: &HassConfig) -> anyhow::Result<HassSink> {
        info!("forwarding events to Home Assistant at {}", config.hass_url);

        if config.hass_token.is_none() {
            warn!("no Home Assistant token configured, requests will be unauthenticated");
        }

        let client =
            build_http_client(Duration::from_millis(config.hass_request_timeout_ms))?;
        let (queue, deliveries) = mpsc::channel(config.hass_queue_capacity);

        tokio::spawn(deliver_events(
            client,
            config.hass_url.trim_end_matches('/').to_string(),
            config.hass_token.clone(),
            deliveries,
        ));

        Ok(HassSink { queue })
    }
}

#[async_trait]
impl Event for HassSink {
    async fn publish(&self, event_type: &str, event: NormalizedEvent) -> Result<(), WebhookError> {
        let delivery = Delivery {
            event_type: event_type.to_string(),
            event,
        };

        self.queue.try_send(delivery).map_err(|err| {
            let cause = match err {
                TrySendError::Full(_) => "queue_full",
                TrySendError::Closed(_) => "queue_closed",
            };
            report_dropped_events(cause, 1);
            warn!(cause, "could not enqueue event for Home Assistant");
            WebhookError::RetryableSinkError
        })
    }
}

async fn deliver_events(
    client: Client,
    base_url: String,
    token: Option<String>,
    mut deliveries: mpsc::Receiver<Delivery>,
) {
    while let Some(delivery) = deliveries.recv().await {
        deliver(&client, &base_url, token.as_deref(), delivery).await;
    }

    info!("Home Assistant delivery queue closed");
}

#[instrument(skip_all, fields(event_type = delivery.event_type.as_str(), status = delivery.event.status.as_str()))]
async fn deliver(client: &Client, base_url: &str, token: Option<&str>, delivery: Delivery) {
    let url = format!("{base_url}/api/events/{}", delivery.event_type);

    let mut request = client.post(&url).json(&delivery.event);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    match request.send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => debug!(status = %response.status(), "event fired on Home Assistant"),
        Err(err) => {
            let cause = if err.is_status() {
                "http_status"
            } else {
                "request_failed"
            };
            report_dropped_events(cause, 1);
            error!("failed to fire event on Home Assistant: {}", err);
        }
    }
}
