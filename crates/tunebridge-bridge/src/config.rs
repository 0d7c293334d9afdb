use serde::{Deserialize, Serialize};

/// Settings for the embedded widget and the bootstrap document that hosts it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// URL of the third-party embed API script, loaded asynchronously.
    pub api_script_url: String,
    /// Name of the global hook the embed API calls once it is available.
    pub api_ready_hook: String,
    /// Identifier of the reserved container element the controller targets.
    pub container_id: String,
    /// Name of the native message handler the sandbox posts to.
    pub message_handler: String,
    /// Widget width as a CSS length.
    pub widget_width: String,
    /// Widget height in pixels.
    pub widget_height: u32,
    /// Whether to start playback right after creation and after each load.
    pub autoplay_after_load: bool,
    /// Delay between a load and the follow-up play call, in milliseconds.
    pub autoplay_delay_ms: u64,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            api_script_url: "https://open.spotify.com/embed/iframe-api/v1".to_string(),
            api_ready_hook: "onSpotifyIframeApiReady".to_string(),
            container_id: "embed-iframe".to_string(),
            message_handler: "spotifyController".to_string(),
            widget_width: "100%".to_string(),
            widget_height: 80,
            autoplay_after_load: true,
            autoplay_delay_ms: 100,
        }
    }
}

/// How inbound playback updates are applied to the observable state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Position changes smaller than this (in seconds) are not applied once
    /// the duration is known.
    pub position_epsilon_seconds: f64,
    /// Re-issue one explicit play command when the sandbox reports that
    /// autoplay was blocked.
    pub retry_blocked_autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_epsilon_seconds: 0.1,
            retry_blocked_autoplay: true,
        }
    }
}

/// Session runtime tuning.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of the host and surface channels.
    pub channel_buffer: usize,
    /// Readiness taking longer than this (in seconds) is logged. The session
    /// keeps waiting regardless.
    pub ready_warning_after_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 64,
            ready_warning_after_seconds: 15,
        }
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Embedded widget configuration.
    pub embed: EmbedConfig,
    /// Playback state application policy.
    pub playback: PlaybackConfig,
    /// Session runtime configuration.
    pub session: SessionConfig,
}
