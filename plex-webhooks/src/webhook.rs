use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, instrument, warn, Span};

use crate::{
    api::{WebhookError, WebhookResponse, WebhookResponseCode},
    event::NormalizedEvent,
    payload::extract_payload,
    prometheus::{report_ignored_request, report_published_event},
    router,
};

/// Turn an inbound request into the event to republish, if it carries one.
pub async fn normalize(
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Option<NormalizedEvent>, WebhookError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let Some(payload) = extract_payload(content_type, body).await? else {
        return Ok(None);
    };

    match payload {
        Value::Object(map) => NormalizedEvent::from_payload(map).map(Some),
        _ => Err(WebhookError::InvalidPayload),
    }
}

#[instrument(skip_all, fields(webhook_id, content_type, event, status))]
pub async fn webhook(
    State(state): State<router::State>,
    Path(webhook_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<WebhookResponse, WebhookError> {
    debug!("got media server webhook");

    Span::current().record("webhook_id", webhook_id.as_str());
    if !state.webhook_ids.contains(&webhook_id) {
        warn!("rejected request for unknown webhook");
        return Err(WebhookError::UnknownWebhook);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .map_or("unknown", |v| v.to_str().unwrap_or("unknown"));
    Span::current().record("content_type", content_type);

    let event = normalize(&headers, body).await.map_err(|err| {
        warn!("rejected invalid payload: {}", err);
        err
    })?;

    let Some(event) = event else {
        report_ignored_request();
        return Ok(WebhookResponse {
            status: WebhookResponseCode::Ignored,
        });
    };

    Span::current().record("event", event.event());
    Span::current().record("status", event.status.as_str());

    let status = event.status.clone();
    state.sink.publish(&state.event_type, event).await?;
    report_published_event(&status);

    Ok(WebhookResponse {
        status: WebhookResponseCode::Ok,
    })
}
