//! Turns typed [`SandboxCommand`]s into scripts the sandbox can evaluate.
//!
//! Nothing else in the crate builds script text.

use tunebridge_bridge::{error::ProtocolError, protocol::SandboxCommand};

use crate::sandbox::bootstrap::DISPATCH_ENTRY_POINT;

/// Serializes commands for a particular sandbox scripting surface.
pub trait CommandEncoder: Send + Sync {
    fn encode(&self, command: &SandboxCommand) -> Result<String, ProtocolError>;
}

/// Encodes commands as a call to the bootstrap document's dispatcher with
/// the command as a JSON argument, e.g.
/// `window.tunebridge.apply({"type":"play"});`.
#[derive(Debug, Clone)]
pub struct DispatchEncoder {
    entry_point: String,
}

impl DispatchEncoder {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    /// Recovers the command from a script produced by [`Self::encode`].
    /// Surfaces that emulate the sandbox natively use this instead of a
    /// script engine.
    pub fn decode(&self, script: &str) -> Result<SandboxCommand, ProtocolError> {
        let argument = script
            .trim()
            .strip_prefix(self.entry_point.as_str())
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(';'))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ProtocolError::UnexpectedShape(script.to_string()))?;
        serde_json::from_str(argument).map_err(|e| ProtocolError::MalformedData {
            event: "command".to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for DispatchEncoder {
    fn default() -> Self {
        Self::new(DISPATCH_ENTRY_POINT)
    }
}

impl CommandEncoder for DispatchEncoder {
    fn encode(&self, command: &SandboxCommand) -> Result<String, ProtocolError> {
        let argument =
            serde_json::to_string(command).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(format!("{}({argument});", self.entry_point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_dispatcher_call() {
        let encoder = DispatchEncoder::default();
        let script = encoder.encode(&SandboxCommand::Play).unwrap();
        assert_eq!(script, r#"window.tunebridge.apply({"type":"play"});"#);
    }

    #[test]
    fn identifiers_cannot_break_out_of_the_call() {
        let encoder = DispatchEncoder::default();
        let command = SandboxCommand::LoadUri {
            uri: "x'); alert(1); ('".to_string(),
            autoplay: false,
            autoplay_delay_ms: 0,
        };
        let script = encoder.encode(&command).unwrap();
        assert!(script.contains(r#""uri":"x'); alert(1); ('""#));
        assert_eq!(encoder.decode(&script).unwrap(), command);
    }

    #[test]
    fn decode_rejects_foreign_scripts() {
        let encoder = DispatchEncoder::default();
        assert!(encoder.decode("document.body.innerHTML = ''").is_err());
        assert!(encoder.decode("window.tunebridge.apply({oops});").is_err());
    }
}
