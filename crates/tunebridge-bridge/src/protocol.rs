//! Wire protocol between native code and the embedded player sandbox.
//!
//! Inbound (sandbox -> native) payloads are either the literal string
//! [`READY_SIGNAL`] or an `{ "event": ..., "data": ... }` envelope. Outbound
//! (native -> sandbox) operations are typed [`SandboxCommand`]s; turning them
//! into something the sandbox can evaluate is the job of a command encoder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, RuntimeError, TransportError};

/// Literal message posted by the bootstrap document once the third-party
/// embed API is callable.
pub const READY_SIGNAL: &str = "ready";

/// Raw notifications produced by a sandbox host surface, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The bootstrap document finished loading. The embed API script may
    /// still be in flight.
    DocumentLoaded,
    /// Loading the bootstrap document failed. `provisional` is true when the
    /// failure happened before navigation was committed.
    NavigationFailed { provisional: bool, reason: String },
    /// A payload posted by the sandbox through the outbound message channel.
    Message(Value),
    /// A script alert panel raised inside the sandbox.
    Alert(String),
}

/// Playback status as reported by the embed controller. Times are in
/// milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PlaybackUpdate {
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Typed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxMessage {
    /// The embed API is ready; the controller can be created.
    Ready,
    /// The creation callback ran. `created` is false when the callback
    /// received no controller object.
    ControllerCreated {
        created: bool,
        message: Option<String>,
    },
    /// Status update from the live controller.
    PlaybackUpdate(PlaybackUpdate),
    /// The embed API reported a failure.
    RuntimeError(RuntimeError),
    /// The sandbox reported a failure of its own transport (e.g. the API
    /// script could not be fetched).
    TransportError(TransportError),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ControllerCreatedData {
    #[serde(default)]
    created: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorData {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

impl SandboxMessage {
    /// Parses a raw payload posted by the sandbox.
    pub fn parse(raw: &Value) -> Result<Self, ProtocolError> {
        match raw {
            Value::String(text) if text == READY_SIGNAL => Ok(Self::Ready),
            Value::Object(_) => {
                let envelope: Envelope = serde_json::from_value(raw.clone())
                    .map_err(|e| ProtocolError::UnexpectedShape(e.to_string()))?;
                Self::from_envelope(envelope)
            }
            other => Err(ProtocolError::UnexpectedShape(other.to_string())),
        }
    }

    fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { event, data } = envelope;
        match event.as_str() {
            "controllerCreated" => {
                let data: ControllerCreatedData = decode_optional(&event, data)?;
                Ok(Self::ControllerCreated {
                    created: data.created.unwrap_or(true),
                    message: data.message,
                })
            }
            "playbackUpdate" => {
                if data.is_null() {
                    return Err(ProtocolError::MalformedData {
                        event,
                        reason: "missing data".to_string(),
                    });
                }
                let update = serde_json::from_value(data).map_err(|e| {
                    ProtocolError::MalformedData {
                        event: event.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self::PlaybackUpdate(update))
            }
            "error" => Ok(classify_error(error_data(data))),
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }
}

fn decode_optional<T: Default + serde::de::DeserializeOwned>(
    event: &str,
    data: Value,
) -> Result<T, ProtocolError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| ProtocolError::MalformedData {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

fn error_data(data: Value) -> ErrorData {
    match data {
        Value::Null => ErrorData::default(),
        Value::String(message) => ErrorData {
            message: Some(message),
            kind: None,
        },
        Value::Object(_) => serde_json::from_value(data.clone()).unwrap_or_else(|_| ErrorData {
            message: Some(data.to_string()),
            kind: None,
        }),
        other => ErrorData {
            message: Some(other.to_string()),
            kind: None,
        },
    }
}

fn classify_error(data: ErrorData) -> SandboxMessage {
    let message = data
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Unknown embed error".to_string());

    let kind = data.kind.as_deref().unwrap_or_else(|| {
        if message.starts_with("Account Error") {
            "account_error"
        } else if message.starts_with("Autoplay failed") {
            "autoplay_failed"
        } else if message.starts_with("Initialization Error") {
            "initialization_error"
        } else if message.starts_with("Failed API script load") {
            "script_load"
        } else if message.contains("null controller") || message.contains("not found") {
            "controller_missing"
        } else {
            ""
        }
    });

    match kind {
        "script_load" => SandboxMessage::TransportError(TransportError::ApiScriptLoad),
        "account_error" => SandboxMessage::RuntimeError(RuntimeError::Account(message)),
        "autoplay_failed" => SandboxMessage::RuntimeError(RuntimeError::AutoplayBlocked(message)),
        "initialization_error" => {
            SandboxMessage::RuntimeError(RuntimeError::Initialization(message))
        }
        "controller_missing" => {
            SandboxMessage::RuntimeError(RuntimeError::ControllerMissing(message))
        }
        _ => SandboxMessage::RuntimeError(RuntimeError::Other(message)),
    }
}

/// Operations the bridge can ask the sandbox to perform.
///
/// Serialized as `{ "type": "createController", ... }` objects which the
/// bootstrap document's dispatcher understands.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SandboxCommand {
    /// Instantiate the player controller against the reserved container.
    CreateController {
        uri: String,
        width: String,
        height: u32,
        autoplay: bool,
    },
    /// Load a new identifier into the existing controller.
    LoadUri {
        uri: String,
        autoplay: bool,
        autoplay_delay_ms: u64,
    },
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
}

impl SandboxCommand {
    /// Identifier targeted by a creation or load command.
    pub fn target_uri(&self) -> Option<&str> {
        match self {
            Self::CreateController { uri, .. } | Self::LoadUri { uri, .. } => Some(uri),
            Self::Play | Self::Pause => None,
        }
    }

    pub fn is_creation(&self) -> bool {
        matches!(self, Self::CreateController { .. })
    }
}
