/// Observable record of what the embedded player is doing.
///
/// Only the bridge controller writes to it; hosts receive snapshots through
/// the state watch channel and render from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    /// True when the sandbox reports `paused == false`.
    pub is_playing: bool,
    /// Playback position in seconds, never negative.
    pub current_position_seconds: f64,
    /// Content duration in seconds. `0.0` means not reported yet.
    pub duration_seconds: f64,
    /// Identifier loaded (or being loaded) in the sandbox; empty when none.
    pub current_content_id: String,
    /// Most recent sandbox or transport error, cleared by the next successful
    /// playback update.
    pub last_error: Option<String>,
}
