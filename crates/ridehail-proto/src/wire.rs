//! Wire envelopes.
//!
//! Every client message is an [`ClientEnvelope`] carrying a caller-chosen
//! correlation id and one intent. The server answers each envelope with
//! exactly one [`Reply`] echoing that id - success carries the payload,
//! failure carries a stable error kind. Events arrive unsolicited as
//! `{"type":"event", "topic":…, "data":…}`.
//!
//! The correlation id makes an intent an ordinary call with a return value;
//! there is no callback-style ack channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{event::Event, intent::Intent};

/// Decode/encode failures at the wire boundary.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The message was not a valid envelope.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One client request: a correlation id plus an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    /// Caller-chosen id, echoed verbatim in the reply.
    pub id: u64,
    /// The requested state change.
    #[serde(flatten)]
    pub intent: Intent,
}

impl ClientEnvelope {
    /// Parse an envelope from message text.
    pub fn decode(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Structured failure reported to the originating caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable kind tag, e.g. `already_assigned`.
    pub kind: String,
    /// Human-readable detail.
    pub message: String,
}

/// The server's answer to one envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Correlation id from the request envelope.
    pub id: u64,
    /// Whether the intent succeeded.
    pub ok: bool,
    /// Success payload. Present iff `ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure detail. Present iff `!ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    /// Build a success reply.
    pub fn success(id: u64, data: Value) -> Self {
        Self { id, ok: true, data: Some(data), error: None }
    }

    /// Build a failure reply.
    pub fn failure(id: u64, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            data: None,
            error: Some(ErrorBody { kind: kind.into(), message: message.into() }),
        }
    }
}

/// Any message the server sends down a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Answer to a client envelope.
    Reply(Reply),
    /// Unsolicited notification.
    Event(Event),
}

impl ServerMessage {
    /// Serialize to message text.
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ids::RideId, ride::RideStatus};

    #[test]
    fn envelope_decodes_flattened_intent() {
        let text = r#"{
            "id": 42,
            "intent": "update_status",
            "ride_id": "0000000000000000000000000000002a",
            "status": "cancelled"
        }"#;

        let envelope = ClientEnvelope::decode(text).unwrap();
        assert_eq!(envelope.id, 42);
        assert_eq!(
            envelope.intent,
            Intent::UpdateStatus { ride_id: RideId(0x2a), status: RideStatus::Cancelled }
        );
    }

    #[test]
    fn reply_omits_absent_fields() {
        let text =
            ServerMessage::Reply(Reply::success(7, serde_json::json!({ "ack": true })))
                .encode()
                .unwrap();
        assert!(text.contains("\"ok\":true"));
        assert!(!text.contains("error"));

        let text = ServerMessage::Reply(Reply::failure(8, "forbidden", "driver not approved"))
            .encode()
            .unwrap();
        assert!(text.contains("\"kind\":\"forbidden\""));
        assert!(!text.contains("data"));
    }

    #[test]
    fn event_message_nests_topic_and_data() {
        let msg = ServerMessage::Event(Event::RideRemoved { ride_id: RideId(1) });
        let json: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["topic"], "ride:removed");

        let back: ServerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
