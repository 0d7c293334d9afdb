//! Text shown on a player card, derived from a playback snapshot.

use tunebridge_bridge::{BridgePhase, playback::PlaybackState};

use crate::{formatting::format_time_range, theme::Theme};

/// Positions at or below this many seconds count as "not started".
const STARTED_THRESHOLD_SECONDS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPresentation {
    pub status: String,
    pub time: String,
    pub content: String,
    pub error: Option<String>,
    pub is_playing: bool,
    /// Play/pause are only meaningful once the player controller exists.
    pub controls_enabled: bool,
    /// The player is stuck waiting for a controller after an error, so the
    /// host may ask for its selection again.
    pub can_retry: bool,
}

impl PlayerPresentation {
    pub fn new(state: &PlaybackState, phase: BridgePhase, theme: &Theme) -> Self {
        let status = if state.is_playing {
            theme.playing_label
        } else if state.current_position_seconds > STARTED_THRESHOLD_SECONDS {
            theme.paused_label
        } else if phase == BridgePhase::ControllerActive {
            theme.ready_label
        } else {
            theme.loading_label
        };

        Self {
            status: status.to_string(),
            time: format_time_range(
                state.current_position_seconds,
                state.duration_seconds,
                theme.time_separator,
            ),
            content: state.current_content_id.clone(),
            error: state
                .last_error
                .as_ref()
                .map(|error| format!("{}{error}", theme.error_prefix)),
            is_playing: state.is_playing,
            controls_enabled: phase == BridgePhase::ControllerActive,
            can_retry: phase == BridgePhase::ControllerPending && state.last_error.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(is_playing: bool, position: f64, duration: f64) -> PlaybackState {
        PlaybackState {
            is_playing,
            current_position_seconds: position,
            duration_seconds: duration,
            current_content_id: "track:A".to_string(),
            last_error: None,
        }
    }

    #[test]
    fn status_follows_playback() {
        let theme = Theme::RETRO_EIGHTIES;
        let active = BridgePhase::ControllerActive;
        assert_eq!(PlayerPresentation::new(&state(true, 0.0, 0.0), active, &theme).status, "NOW PLAYING");
        assert_eq!(PlayerPresentation::new(&state(false, 12.5, 245.0), active, &theme).status, "PAUSED");
        assert_eq!(PlayerPresentation::new(&state(false, 0.05, 245.0), active, &theme).status, "READY");
        assert_eq!(
            PlayerPresentation::new(&state(false, 0.0, 0.0), BridgePhase::AwaitingReady, &theme).status,
            "LOADING"
        );
    }

    #[test]
    fn skins_only_change_wording() {
        let snapshot = state(true, 61.0, 120.0);
        let phase = BridgePhase::ControllerActive;
        let retro = PlayerPresentation::new(&snapshot, phase, &Theme::RETRO_NINETIES);
        let soft = PlayerPresentation::new(&snapshot, phase, &Theme::NEUMORPHIC);
        assert_eq!(retro.status, "PLAYIN'");
        assert_eq!(retro.time, "1:01 / 2:00");
        assert_eq!(soft.time, "1:01 | 2:00");
        assert_eq!(retro.content, soft.content);
        assert!(retro.controls_enabled && soft.controls_enabled);
    }

    #[test]
    fn errors_are_prefixed() {
        let mut snapshot = state(false, 0.0, 0.0);
        snapshot.last_error = Some("Autoplay failed".to_string());
        let presentation =
            PlayerPresentation::new(&snapshot, BridgePhase::ControllerPending, &Theme::SYNTHWAVE);
        assert_eq!(presentation.error.as_deref(), Some("Player Error: Autoplay failed"));
        assert_eq!(presentation.time, "--:-- / --:--");
        assert!(!presentation.controls_enabled);
        assert!(presentation.can_retry);
    }

    #[test]
    fn active_players_never_offer_a_retry() {
        let mut snapshot = state(true, 3.0, 120.0);
        snapshot.last_error = Some("Autoplay failed".to_string());
        let presentation =
            PlayerPresentation::new(&snapshot, BridgePhase::ControllerActive, &Theme::SYNTHWAVE);
        assert!(!presentation.can_retry);
    }
}
