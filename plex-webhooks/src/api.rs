use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum WebhookResponseCode {
    /// An event was normalized and handed to the sink
    Ok,
    /// The request carried no usable payload, nothing was published
    Ignored,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebhookResponse {
    pub status: WebhookResponseCode,
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error("payload must be a JSON object")]
    InvalidPayload,

    #[error("payload submitted without an event name")]
    MissingEventName,
    #[error("payload submitted without Metadata.type")]
    MissingMediaType,
    #[error("playback event submitted without Player.uuid")]
    MissingPlayerUuid,

    #[error("unknown webhook id")]
    UnknownWebhook,

    #[error("transient error, please retry")]
    RetryableSinkError,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::RequestParsingError(_)
            | WebhookError::InvalidPayload
            | WebhookError::MissingEventName
            | WebhookError::MissingMediaType
            | WebhookError::MissingPlayerUuid => (StatusCode::BAD_REQUEST, self.to_string()),

            WebhookError::UnknownWebhook => (StatusCode::NOT_FOUND, self.to_string()),

            WebhookError::RetryableSinkError => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
        }
        .into_response()
    }
}
