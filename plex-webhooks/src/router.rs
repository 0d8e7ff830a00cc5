use std::collections::HashSet;
use std::future::ready;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{sinks, webhook};

use crate::prometheus::{setup_metrics_recorder, track_metrics};

#[derive(Clone)]
pub struct State {
    pub sink: Arc<dyn sinks::Event + Send + Sync>,
    pub webhook_ids: Arc<HashSet<String>>,
    pub event_type: String,
}

async fn index() -> &'static str {
    "plex-webhooks"
}

pub fn router(
    sink: Arc<dyn sinks::Event + Send + Sync>,
    webhook_ids: HashSet<String>,
    event_type: String,
    max_body_size: usize,
    metrics: bool,
) -> Router {
    let state = State {
        sink,
        webhook_ids: Arc::new(webhook_ids),
        event_type,
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index)) // No async loop to watch beyond the sink queue
        .route(
            "/api/webhook/:webhook_id",
            post(webhook::webhook).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
