#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use http_body_util::BodyExt; // for `collect`
use reqwest::multipart::Form;
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use plex_webhooks::api::WebhookError;
use plex_webhooks::event::NormalizedEvent;
use plex_webhooks::router::router;
use plex_webhooks::sinks::Event;

pub const WEBHOOK_ID: &str = "living-room-plex";
pub const EVENT_TYPE: &str = "plex_webhooks";
pub const MAX_BODY_SIZE: usize = 64 * 1024;

#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<(String, NormalizedEvent)>>>,
}

impl MemorySink {
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Published events as they would be serialized onto the bus
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(event_type, event)| {
                (event_type.clone(), serde_json::to_value(event).unwrap())
            })
            .collect()
    }
}

#[async_trait]
impl Event for MemorySink {
    async fn publish(&self, event_type: &str, event: NormalizedEvent) -> Result<(), WebhookError> {
        self.events
            .lock()
            .unwrap()
            .push((event_type.to_string(), event));
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl Event for FailingSink {
    async fn publish(&self, _: &str, _: NormalizedEvent) -> Result<(), WebhookError> {
        Err(WebhookError::RetryableSinkError)
    }
}

pub fn setup_router<S: Event + Send + Sync + 'static>(sink: S) -> Router {
    router(
        Arc::new(sink),
        HashSet::from([WEBHOOK_ID.to_string()]),
        EVENT_TYPE.to_string(),
        MAX_BODY_SIZE,
        false,
    )
}

pub fn webhook_uri(webhook_id: &str) -> String {
    format!("/api/webhook/{webhook_id}")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        request = request.header(header::CONTENT_TYPE, content_type);
    }

    let response = app
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        body: body.to_vec(),
    }
}

pub async fn post_json(app: Router, payload: &Value) -> TestResponse {
    send(
        app,
        Method::POST,
        &webhook_uri(WEBHOOK_ID),
        Some("application/json"),
        serde_json::to_vec(payload).unwrap(),
    )
    .await
}

pub async fn post_multipart(app: Router, form: Form) -> TestResponse {
    let content_type = format!("multipart/form-data; boundary={}", form.boundary());

    let mut stream = form.into_stream();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }

    send(
        app,
        Method::POST,
        &webhook_uri(WEBHOOK_ID),
        Some(&content_type),
        body,
    )
    .await
}
