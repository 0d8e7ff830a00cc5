use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::WebhookError;

/// JSON object sent by the media server, as found in the request.
pub type EventPayload = Map<String, Value>;

/// Simplified playback status derived from the media server event name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Playing,
    Stopped,
    New,
    /// Unrecognized events keep their raw name so consumers can still filter on them
    Other(String),
}

impl Status {
    pub fn classify(event: &str) -> Status {
        match event {
            "media.play" | "media.resume" => Status::Playing,
            "media.pause" | "media.stop" => Status::Stopped,
            "library.new" => Status::New,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Playing => "PLAYING",
            Status::Stopped => "STOPPED",
            Status::New => "NEW",
            Status::Other(event) => event,
        }
    }

    /// Playback events are the ones tied to a player, and carry its uuid.
    pub fn is_playback(&self) -> bool {
        matches!(self, Status::Playing | Status::Stopped)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The payload as republished on the event bus: every key of the original
/// object, with `status`, `type` and (for playback) `playerUuid` overwritten.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedEvent {
    #[serde(flatten)]
    pub payload: EventPayload,
    pub status: Status,
    // 'track' is music, 'episode' is TV, 'movie' is a movie, 'clip' is live TV
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(rename = "playerUuid", skip_serializing_if = "Option::is_none")]
    pub player_uuid: Option<String>,
}

impl NormalizedEvent {
    pub fn from_payload(mut payload: EventPayload) -> Result<NormalizedEvent, WebhookError> {
        let event = payload
            .get("event")
            .and_then(Value::as_str)
            .ok_or(WebhookError::MissingEventName)?;
        let status = Status::classify(event);

        let media_type = nested_str(&payload, "Metadata", "type")
            .ok_or(WebhookError::MissingMediaType)?
            .to_string();

        let player_uuid = if status.is_playback() {
            let uuid = nested_str(&payload, "Player", "uuid")
                .ok_or(WebhookError::MissingPlayerUuid)?
                .to_string();
            payload.remove("playerUuid");
            Some(uuid)
        } else {
            None
        };

        match status {
            Status::Playing => debug!("media server started playing"),
            Status::Stopped => debug!("media server stopped playing"),
            Status::New => debug!("media server got new media"),
            Status::Other(ref event) => {
                debug!(event = event.as_str(), "unclassified media server event")
            }
        }

        payload.remove("status");
        payload.remove("type");

        Ok(NormalizedEvent {
            payload,
            status,
            media_type,
            player_uuid,
        })
    }

    /// Raw event name, e.g. `media.play`.
    pub fn event(&self) -> &str {
        self.payload
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

fn nested_str<'a>(payload: &'a EventPayload, object: &str, key: &str) -> Option<&'a str> {
    payload
        .get(object)
        .and_then(Value::as_object)
        .and_then(|inner| inner.get(key))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> EventPayload {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    fn normalize(value: Value) -> Result<NormalizedEvent, WebhookError> {
        NormalizedEvent::from_payload(payload(value))
    }

    #[test]
    fn playback_events_are_classified() {
        for (event, status) in [
            ("media.play", "PLAYING"),
            ("media.resume", "PLAYING"),
            ("media.pause", "STOPPED"),
            ("media.stop", "STOPPED"),
        ] {
            let normalized = normalize(json!({
                "event": event,
                "Metadata": {"type": "episode"},
                "Player": {"uuid": "player-1"},
            }))
            .unwrap();

            assert_eq!(normalized.status.as_str(), status, "{event}");
            assert_eq!(normalized.player_uuid.as_deref(), Some("player-1"));
            assert_eq!(normalized.media_type, "episode");
        }
    }

    #[test]
    fn play_event_serializes_with_derived_fields() {
        let normalized = normalize(json!({
            "event": "media.play",
            "Metadata": {"type": "movie"},
            "Player": {"uuid": "abc-123"},
        }))
        .unwrap();

        assert_json_eq!(
            serde_json::to_value(&normalized).unwrap(),
            json!({
                "event": "media.play",
                "status": "PLAYING",
                "type": "movie",
                "playerUuid": "abc-123",
                "Metadata": {"type": "movie"},
                "Player": {"uuid": "abc-123"},
            })
        );
    }

    #[test]
    fn library_new_is_marked_new_without_player() {
        let normalized = normalize(json!({
            "event": "library.new",
            "Metadata": {"type": "track"},
            "Player": {"uuid": "ignored"},
        }))
        .unwrap();

        assert_eq!(normalized.status, Status::New);
        assert_eq!(normalized.player_uuid, None);

        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["status"], "NEW");
        assert!(value.get("playerUuid").is_none());
    }

    #[test]
    fn unknown_events_echo_their_name() {
        let normalized = normalize(json!({
            "event": "media.scrobble",
            "Metadata": {"type": "clip"},
        }))
        .unwrap();

        assert_eq!(normalized.status, Status::Other("media.scrobble".to_string()));
        assert_eq!(normalized.event(), "media.scrobble");

        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["status"], "media.scrobble");
        assert_eq!(value["type"], "clip");
    }

    #[test]
    fn existing_derived_keys_are_overwritten() {
        let normalized = normalize(json!({
            "event": "media.stop",
            "status": "bogus",
            "type": "bogus",
            "playerUuid": "bogus",
            "Metadata": {"type": "movie"},
            "Player": {"uuid": "real"},
        }))
        .unwrap();

        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["status"], "STOPPED");
        assert_eq!(value["type"], "movie");
        assert_eq!(value["playerUuid"], "real");
    }

    #[test]
    fn non_playback_events_keep_an_incoming_player_uuid() {
        let normalized = normalize(json!({
            "event": "library.on.deck",
            "playerUuid": "kept",
            "Metadata": {"type": "movie"},
        }))
        .unwrap();

        assert_eq!(normalized.player_uuid, None);
        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["playerUuid"], "kept");
    }

    #[test]
    fn missing_event_is_rejected() {
        let err = normalize(json!({"Metadata": {"type": "movie"}})).unwrap_err();
        assert!(matches!(err, WebhookError::MissingEventName));

        let err = normalize(json!({"event": 42, "Metadata": {"type": "movie"}})).unwrap_err();
        assert!(matches!(err, WebhookError::MissingEventName));
    }

    #[test]
    fn missing_media_type_is_rejected() {
        let err = normalize(json!({"event": "library.new"})).unwrap_err();
        assert!(matches!(err, WebhookError::MissingMediaType));

        let err = normalize(json!({"event": "library.new", "Metadata": {}})).unwrap_err();
        assert!(matches!(err, WebhookError::MissingMediaType));
    }

    #[test]
    fn playback_without_player_is_rejected() {
        let err = normalize(json!({
            "event": "media.resume",
            "Metadata": {"type": "track"},
        }))
        .unwrap_err();
        assert!(matches!(err, WebhookError::MissingPlayerUuid));
    }
}
