//! Error taxonomy of the bridge.
//!
//! None of these errors terminate a session on their own. They end up in
//! [`crate::playback::PlaybackState::last_error`] so the host can display them.

/// Failure of the sandbox itself: the bootstrap document could not be loaded,
/// the third-party script could not be fetched, or a command could not be
/// evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The bootstrap document failed after navigation was committed.
    #[error("Failed to load embed: {0}")]
    DocumentLoad(String),
    /// The bootstrap document failed before navigation was committed.
    #[error("Failed to start loading embed: {0}")]
    ProvisionalLoad(String),
    /// The third-party embed API script could not be fetched.
    #[error("Failed API script load")]
    ApiScriptLoad,
    /// Evaluating a command inside the sandbox threw or was rejected.
    #[error("Script evaluation failed: {0}")]
    Evaluation(String),
    /// The sandbox listener has been detached or the surface stopped.
    #[error("Sandbox surface is detached")]
    Detached,
}

impl TransportError {
    /// Whether the sandbox may be unusable after this error. The bridge does
    /// not retry these internally; the host is expected to recreate the
    /// whole session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DocumentLoad(_) | Self::ProvisionalLoad(_) | Self::ApiScriptLoad
        )
    }
}

/// Failure reported by the third-party embed API running in the sandbox.
///
/// Every variant carries the full message as reported, which is also what is
/// displayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// Account or permission problem (premium required, not logged in).
    #[error("{0}")]
    Account(String),
    /// The platform refused to start playback without a user gesture.
    #[error("{0}")]
    AutoplayBlocked(String),
    /// The widget failed to initialize.
    #[error("{0}")]
    Initialization(String),
    /// The in-sandbox controller (or its container) could not be found or
    /// was created empty.
    #[error("{0}")]
    ControllerMissing(String),
    /// Anything else reported through the `error` event.
    #[error("{0}")]
    Other(String),
}

/// Malformed or unrecognized inbound message. Logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The payload is neither the ready signal nor an event envelope.
    #[error("unrecognized message shape: {0}")]
    UnexpectedShape(String),
    /// The envelope names an event this bridge does not know.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    /// The event data could not be decoded.
    #[error("malformed `{event}` payload: {reason}")]
    MalformedData { event: String, reason: String },
    /// A command could not be encoded for the sandbox.
    #[error("failed to encode command: {0}")]
    Encode(String),
}

/// Any error the bridge can surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The session was disposed or its owner task ended.
    #[error("bridge session is closed")]
    SessionClosed,
}
