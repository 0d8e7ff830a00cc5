// prometheus exporter setup

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::IntoResponse,
};
use metrics::counter;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::event::Status;
use crate::payload::MalformedPart;

pub const WEBHOOK_EVENTS_DROPPED_TOTAL: &str = "plex_webhooks_events_dropped_total";
const WEBHOOK_EVENTS_PUBLISHED_TOTAL: &str = "plex_webhooks_events_published_total";
const WEBHOOK_PARTS_SKIPPED_TOTAL: &str = "plex_webhooks_parts_skipped_total";
const WEBHOOK_REQUESTS_IGNORED_TOTAL: &str = "plex_webhooks_requests_ignored_total";
const METRIC_HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
const METRIC_HTTP_REQUESTS_DURATION_SECONDS: &str = "http_requests_duration_seconds";

pub fn report_dropped_events(cause: &'static str, quantity: u64) {
    counter!(WEBHOOK_EVENTS_DROPPED_TOTAL, "cause" => cause).increment(quantity);
}

pub fn report_published_event(status: &Status) {
    counter!(WEBHOOK_EVENTS_PUBLISHED_TOTAL, "status" => status_label(status)).increment(1);
}

pub fn report_skipped_part(part: &MalformedPart) {
    counter!(WEBHOOK_PARTS_SKIPPED_TOTAL, "cause" => part.cause()).increment(1);
}

pub fn report_ignored_request() {
    counter!(WEBHOOK_REQUESTS_IGNORED_TOTAL).increment(1);
}

// Unclassified events are bucketed together to keep label cardinality bounded
fn status_label(status: &Status) -> String {
    match status {
        Status::Other(_) => "other".to_string(),
        status => status.as_str().to_string(),
    }
}

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(METRIC_HTTP_REQUESTS_DURATION_SECONDS.to_string()),
            EXPONENTIAL_SECONDS,
        )
        .unwrap()
        .install_recorder()
        .unwrap()
}

/// Middleware to record some common HTTP metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    // Webhook ids live in the path, so label with the route template when there is one
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    counter!(METRIC_HTTP_REQUESTS_TOTAL, &labels).increment(1);
    metrics::histogram!(METRIC_HTTP_REQUESTS_DURATION_SECONDS, &labels).record(latency);

    response
}
