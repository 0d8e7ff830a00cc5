use bytes::Bytes;
use futures::stream;
use multer::{parse_boundary, Multipart};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::WebhookError;
use crate::prometheus::report_skipped_part;

/// A multipart section that cannot carry the event payload. Skipped, never fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedPart {
    #[error("part did not contain a content-type header")]
    MissingContentType,
    #[error("part is of type {0}, not JSON")]
    NotJson(String),
}

impl MalformedPart {
    pub fn cause(&self) -> &'static str {
        match self {
            MalformedPart::MissingContentType => "missing_content_type",
            MalformedPart::NotJson(_) => "not_json",
        }
    }
}

#[derive(Error, Debug)]
enum MultipartError {
    #[error(transparent)]
    Multipart(#[from] multer::Error),
    #[error("JSON part could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pull the event payload out of a request body.
///
/// Multipart bodies are scanned in order and the first `application/json`
/// part wins. Anything that cannot be read as multipart is parsed as a single
/// JSON document instead. `Ok(None)` means the request carried no data.
pub async fn extract_payload(
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Option<Value>, WebhookError> {
    let payload = match read_multipart(content_type, body.clone()).await {
        Ok(found) => {
            info!("multipart request received");
            found
        }
        Err(err) => {
            warn!("request is not of type multipart: {}", err);
            Some(serde_json::from_slice::<Value>(&body)?)
        }
    };

    match payload {
        Some(value) if !is_empty(&value) => Ok(Some(value)),
        _ => {
            warn!("no data received");
            Ok(None)
        }
    }
}

async fn read_multipart(
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Option<Value>, MultipartError> {
    let boundary = parse_boundary(content_type.unwrap_or_default())?;

    let body_stream = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = Multipart::new(body_stream, boundary);

    let mut part_count = 0;
    while let Some(field) = multipart.next_field().await? {
        part_count += 1;

        let part_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let malformed = match part_type.as_deref() {
            Some("application/json") => {
                let data = field.bytes().await?;
                let value = serde_json::from_slice(&data)?;
                info!(part = part_count, "parsed part of type JSON, stop parsing");
                return Ok(Some(value));
            }
            Some(other) => MalformedPart::NotJson(other.to_string()),
            None => MalformedPart::MissingContentType,
        };

        warn!(part = part_count, "skipping multipart part: {}", malformed);
        report_skipped_part(&malformed);
    }

    debug!(parts = part_count, "multipart request holds no JSON part");
    Ok(None)
}

/// Payloads that hold nothing are treated like a missing payload.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
