use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Frame sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Chat {
        #[serde(rename = "message")]
        text: String,
    },
    Speech {
        #[serde(with = "base64_bytes")]
        audio: Vec<u8>, // WAV container, base64 on the wire
        language_code: String,
        target_language_code: String,
    },
}

impl OutboundMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Chat { .. } => "chat",
            OutboundMessage::Speech { .. } => "speech",
        }
    }
}

/// Frame received from the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "chat_response")]
    ChatReply {
        #[serde(rename = "message")]
        text: String,
    },
    #[serde(rename = "speech_response")]
    SpeechReply {
        transcript: String,
        #[serde(rename = "message")]
        reply_text: String,
        #[serde(with = "base64_bytes")]
        audio: Vec<u8>,
    },
    /// Backend-reported failure
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "message")]
        text: String,
    },
}

const INBOUND_TYPES: &[&str] = &["chat_response", "speech_response", "error"];

impl InboundMessage {
    /// Decode one text frame.
    ///
    /// Frames whose `type` is not one we understand are reported as
    /// `UnknownType`; anything else that fails to parse is `MalformedFrame`.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)
            .map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::MalformedFrame("missing \"type\" field".to_string()))?;

        if !INBOUND_TYPES.contains(&kind) {
            return Err(ProtocolError::UnknownType(kind.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
