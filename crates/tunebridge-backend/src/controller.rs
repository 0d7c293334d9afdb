//! The bridge controller state machine.
//!
//! The controller does no I/O. Every input (host request, parsed sandbox
//! message, transport failure) mutates the session and the observable
//! [`PlaybackState`] and returns at most one [`SandboxCommand`] for the
//! session runtime to execute inside the sandbox.
//!
//! Creating the in-sandbox player controller needs a [`RuntimeReady`] token,
//! which only exists once the ready signal arrived, and loading, playing or
//! pausing needs an [`ActiveController`], which only exists once creation was
//! confirmed. The phase therefore cannot regress and a second creation cannot
//! be expressed once the controller is active.

use serde_json::Value;
use tunebridge_bridge::{
    BridgePhase,
    config::{Config, EmbedConfig, PlaybackConfig},
    content::ContentId,
    error::{BridgeError, RuntimeError, TransportError},
    playback::PlaybackState,
    protocol::{PlaybackUpdate, SandboxCommand, SandboxMessage, SurfaceEvent},
};

/// Proof that the embed API announced readiness.
#[derive(Debug)]
struct RuntimeReady(());

impl RuntimeReady {
    fn create_controller(&self, id: &ContentId, embed: &EmbedConfig) -> SandboxCommand {
        SandboxCommand::CreateController {
            uri: id.to_string(),
            width: embed.widget_width.clone(),
            height: embed.widget_height,
            autoplay: embed.autoplay_after_load,
        }
    }
}

/// The live in-sandbox player controller.
#[derive(Debug)]
struct ActiveController {
    loaded: ContentId,
    autoplay_retried: bool,
}

impl ActiveController {
    fn new(loaded: ContentId) -> Self {
        Self {
            loaded,
            autoplay_retried: false,
        }
    }

    /// Loads `id` unless it is already the loaded identifier. The marker is
    /// updated before the command runs so repeated requests are no-ops.
    fn load(&mut self, id: ContentId, embed: &EmbedConfig) -> Option<SandboxCommand> {
        if self.loaded == id {
            return None;
        }
        let command = SandboxCommand::LoadUri {
            uri: id.to_string(),
            autoplay: embed.autoplay_after_load,
            autoplay_delay_ms: embed.autoplay_delay_ms,
        };
        self.loaded = id;
        self.autoplay_retried = false;
        Some(command)
    }

    fn play(&self) -> SandboxCommand {
        SandboxCommand::Play
    }

    fn pause(&self) -> SandboxCommand {
        SandboxCommand::Pause
    }
}

#[derive(Debug)]
enum Stage {
    Uninitialized {
        pending: Option<ContentId>,
    },
    AwaitingReady {
        pending: Option<ContentId>,
    },
    /// Ready, but no creation attempt is outstanding. `pending` survives a
    /// failed creation until the host asks again.
    Idle {
        runtime: RuntimeReady,
        pending: Option<ContentId>,
    },
    /// The creation command was issued; waiting for `controllerCreated`.
    Creating {
        runtime: RuntimeReady,
        requested: ContentId,
        pending: Option<ContentId>,
    },
    Active(ActiveController),
}

impl Stage {
    fn phase(&self) -> BridgePhase {
        match self {
            Self::Uninitialized { .. } => BridgePhase::Uninitialized,
            Self::AwaitingReady { .. } => BridgePhase::AwaitingReady,
            Self::Idle { .. } | Self::Creating { .. } => BridgePhase::ControllerPending,
            Self::Active(_) => BridgePhase::ControllerActive,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Uninitialized { pending: None }
    }
}

/// State machine behind one bridge session.
#[derive(Debug)]
pub struct BridgeController {
    stage: Stage,
    state: PlaybackState,
    initial: Option<ContentId>,
    embed: EmbedConfig,
    playback: PlaybackConfig,
    fatal: Option<TransportError>,
    disposed: bool,
}

impl BridgeController {
    pub fn new(config: &Config, initial: Option<ContentId>) -> Self {
        Self {
            stage: Stage::default(),
            state: PlaybackState::default(),
            initial: initial.filter(|id| !id.is_empty()),
            embed: config.embed.clone(),
            playback: config.playback.clone(),
            fatal: None,
            disposed: false,
        }
    }

    pub fn phase(&self) -> BridgePhase {
        self.stage.phase()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_runtime_ready(&self) -> bool {
        matches!(
            self.stage,
            Stage::Idle { .. } | Stage::Creating { .. } | Stage::Active(_)
        )
    }

    /// Identifier most recently handed (or queued behind a pending creation)
    /// to the sandbox. `None` until the first creation attempt.
    pub fn last_requested_content_id(&self) -> Option<&ContentId> {
        match &self.stage {
            Stage::Creating {
                requested, pending, ..
            } => pending.as_ref().or(Some(requested)),
            Stage::Active(active) => Some(&active.loaded),
            _ => None,
        }
    }

    /// Identifier waiting for readiness or for creation to be confirmed.
    pub fn pending_content_id(&self) -> Option<&ContentId> {
        match &self.stage {
            Stage::Uninitialized { pending }
            | Stage::AwaitingReady { pending }
            | Stage::Idle { pending, .. }
            | Stage::Creating { pending, .. } => pending.as_ref(),
            _ => None,
        }
    }

    /// Transport failure that left the sandbox in a possibly unusable state.
    pub fn fatal_error(&self) -> Option<&TransportError> {
        self.fatal.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The surface started loading the bootstrap document.
    pub fn begin_loading(&mut self) {
        if self.disposed {
            return;
        }
        self.stage = match self.take_stage() {
            Stage::Uninitialized { pending } => Stage::AwaitingReady { pending },
            other => other,
        };
    }

    /// Host asks for `id` to be loaded.
    pub fn request_load(&mut self, id: ContentId) -> Option<SandboxCommand> {
        if self.disposed {
            log::debug!("Ignoring load of {id} on a disposed session.");
            return None;
        }
        if id.is_empty() {
            log::warn!("Ignoring load request with an empty content identifier.");
            return None;
        }

        let (stage, command) = match self.take_stage() {
            Stage::Uninitialized { .. } => (Stage::Uninitialized { pending: Some(id) }, None),
            Stage::AwaitingReady { .. } => {
                log::debug!("Embed API not ready yet, deferring load of {id}.");
                (Stage::AwaitingReady { pending: Some(id) }, None)
            }
            Stage::Idle { runtime, .. } => self.start_creation(runtime, id),
            Stage::Creating {
                runtime, requested, ..
            } => {
                // absorbed until creation is confirmed
                let pending = if requested == id { None } else { Some(id) };
                (
                    Stage::Creating {
                        runtime,
                        requested,
                        pending,
                    },
                    None,
                )
            }
            Stage::Active(mut active) => {
                let command = active.load(id, &self.embed);
                if command.is_some() {
                    log::info!("Loading new content {} into the embed controller.", active.loaded);
                    self.state.current_content_id = active.loaded.to_string();
                }
                (Stage::Active(active), command)
            }
        };
        self.stage = stage;
        command
    }

    pub fn play(&mut self) -> Option<SandboxCommand> {
        match &self.stage {
            Stage::Active(active) if !self.disposed => Some(active.play()),
            _ => {
                log::debug!("Play ignored, the embed controller is not active.");
                None
            }
        }
    }

    pub fn pause(&mut self) -> Option<SandboxCommand> {
        match &self.stage {
            Stage::Active(active) if !self.disposed => Some(active.pause()),
            _ => {
                log::debug!("Pause ignored, the embed controller is not active.");
                None
            }
        }
    }

    /// Feeds a raw surface notification into the state machine.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> Option<SandboxCommand> {
        if self.disposed {
            return None;
        }
        match event {
            SurfaceEvent::DocumentLoaded => {
                log::info!("Embed bootstrap document loaded.");
                None
            }
            SurfaceEvent::NavigationFailed {
                provisional,
                reason,
            } => {
                let error = if provisional {
                    TransportError::ProvisionalLoad(reason)
                } else {
                    TransportError::DocumentLoad(reason)
                };
                self.handle_transport_error(error);
                None
            }
            SurfaceEvent::Alert(text) => {
                log::info!("Embed alert: {text}");
                None
            }
            SurfaceEvent::Message(raw) => self.handle_raw_message(&raw),
        }
    }

    /// Parses and applies a raw sandbox payload. Malformed payloads are
    /// logged and ignored.
    pub fn handle_raw_message(&mut self, raw: &Value) -> Option<SandboxCommand> {
        match SandboxMessage::parse(raw) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                log::warn!("Ignoring sandbox message {raw}: {e}");
                None
            }
        }
    }

    pub fn handle_message(&mut self, message: SandboxMessage) -> Option<SandboxCommand> {
        if self.disposed {
            log::debug!("Dropping sandbox message delivered after disposal.");
            return None;
        }
        match message {
            SandboxMessage::Ready => self.on_ready(),
            SandboxMessage::ControllerCreated { created, message } => {
                self.on_controller_created(created, message)
            }
            SandboxMessage::PlaybackUpdate(update) => {
                self.apply_update(update);
                None
            }
            SandboxMessage::RuntimeError(error) => self.on_runtime_error(error),
            SandboxMessage::TransportError(error) => {
                self.handle_transport_error(error);
                None
            }
        }
    }

    /// Records a transport failure. The phase is left untouched.
    pub fn handle_transport_error(&mut self, error: TransportError) {
        if self.disposed {
            return;
        }
        log::error!("Embed transport error: {error}");
        if error.is_fatal() {
            self.fatal = Some(error.clone());
        }
        self.record_error(error);
    }

    /// A command could not be evaluated in the sandbox. A failed creation
    /// clears the creation marker so the next load request retries it.
    pub fn handle_execute_failure(&mut self, command: &SandboxCommand, error: TransportError) {
        if self.disposed {
            return;
        }
        self.handle_transport_error(error);
        if !command.is_creation() {
            return;
        }
        self.stage = match self.take_stage() {
            Stage::Creating {
                runtime,
                requested,
                pending,
            } if command.target_uri() == Some(requested.as_str()) => {
                log::warn!("Creation of the embed controller for {requested} failed; next load will retry.");
                self.creation_failed(runtime, requested, pending)
            }
            other => other,
        };
    }

    /// Ends the session. Every later input is ignored.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    /// Makes `error` the host-visible error text.
    fn record_error(&mut self, error: impl Into<BridgeError>) {
        self.state.last_error = Some(error.into().to_string());
    }

    fn take_stage(&mut self) -> Stage {
        std::mem::take(&mut self.stage)
    }

    fn start_creation(
        &mut self,
        runtime: RuntimeReady,
        id: ContentId,
    ) -> (Stage, Option<SandboxCommand>) {
        log::info!("Creating the embed controller for {id}.");
        let command = runtime.create_controller(&id, &self.embed);
        self.state.current_content_id = id.to_string();
        (
            Stage::Creating {
                runtime,
                requested: id,
                pending: None,
            },
            Some(command),
        )
    }

    /// Falls back to idle after a failed creation, keeping the host's latest
    /// request queued. Nothing is retried until the host asks again.
    fn creation_failed(
        &mut self,
        runtime: RuntimeReady,
        requested: ContentId,
        pending: Option<ContentId>,
    ) -> Stage {
        // nothing was loaded
        self.state.current_content_id.clear();
        Stage::Idle {
            runtime,
            pending: Some(pending.unwrap_or(requested)),
        }
    }

    fn on_ready(&mut self) -> Option<SandboxCommand> {
        let (stage, command) = match self.take_stage() {
            Stage::Uninitialized { pending } | Stage::AwaitingReady { pending } => {
                log::info!("Embed API ready.");
                let runtime = RuntimeReady(());
                match pending.or_else(|| self.initial.clone()) {
                    Some(id) => self.start_creation(runtime, id),
                    None => {
                        log::info!("Embed API ready, but no content requested yet.");
                        (
                            Stage::Idle {
                                runtime,
                                pending: None,
                            },
                            None,
                        )
                    }
                }
            }
            other => {
                log::warn!("Ignoring repeated ready signal.");
                (other, None)
            }
        };
        self.stage = stage;
        command
    }

    fn on_controller_created(
        &mut self,
        created: bool,
        message: Option<String>,
    ) -> Option<SandboxCommand> {
        let (stage, command) = match self.take_stage() {
            Stage::Creating {
                runtime,
                requested,
                pending,
            } => {
                if created {
                    log::info!("Embed controller created for {requested}.");
                    self.state.last_error = None;
                    let mut active = ActiveController::new(requested);
                    let command = pending.and_then(|id| active.load(id, &self.embed));
                    if command.is_some() {
                        self.state.current_content_id = active.loaded.to_string();
                    }
                    (Stage::Active(active), command)
                } else {
                    let message = message
                        .unwrap_or_else(|| "Embed controller creation returned no controller".to_string());
                    log::error!("{message}");
                    self.state.last_error = Some(message);
                    (self.creation_failed(runtime, requested, pending), None)
                }
            }
            other => {
                log::warn!("Unexpected controllerCreated event in phase {:?}.", other.phase());
                (other, None)
            }
        };
        self.stage = stage;
        command
    }

    fn on_runtime_error(&mut self, error: RuntimeError) -> Option<SandboxCommand> {
        log::warn!("Embed reported an error: {error}");
        let blocked = matches!(error, RuntimeError::AutoplayBlocked(_));
        self.record_error(error);

        if !blocked || !self.playback.retry_blocked_autoplay {
            return None;
        }
        match &mut self.stage {
            Stage::Active(active) if !active.autoplay_retried => {
                active.autoplay_retried = true;
                log::info!("Retrying playback once after blocked autoplay.");
                Some(active.play())
            }
            _ => None,
        }
    }

    fn apply_update(&mut self, update: PlaybackUpdate) {
        let epsilon = self.playback.position_epsilon_seconds;
        let state = &mut self.state;
        let duration_known = state.duration_seconds > 0.0;

        if let Some(paused) = update.paused {
            state.is_playing = !paused;
        }
        if let Some(position_ms) = update.position.filter(|value| value.is_finite()) {
            let position = (position_ms / 1000.0).max(0.0);
            let negligible = (position - state.current_position_seconds).abs() < epsilon;
            if !(duration_known && negligible) {
                state.current_position_seconds = position;
            }
        }
        // a zero duration means "unknown" and never replaces a known one
        if let Some(duration_ms) = update.duration.filter(|value| value.is_finite() && *value > 0.0) {
            let duration = duration_ms / 1000.0;
            if !duration_known || (duration - state.duration_seconds).abs() > epsilon {
                state.duration_seconds = duration;
            }
        }
        if let Some(uri) = update.uri.filter(|uri| !uri.is_empty()) {
            if state.current_content_id != uri {
                state.current_content_id = uri.clone();
            }
            if let Stage::Active(active) = &mut self.stage {
                active.loaded = ContentId::new(uri);
            }
        }
        self.state.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn controller(initial: Option<&str>) -> BridgeController {
        let mut controller = BridgeController::new(&Config::default(), initial.map(ContentId::new));
        controller.begin_loading();
        controller
    }

    fn active(initial: &str) -> BridgeController {
        let mut controller = controller(Some(initial));
        controller.handle_message(SandboxMessage::Ready);
        controller.handle_message(SandboxMessage::ControllerCreated {
            created: true,
            message: None,
        });
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
        controller
    }

    fn update(paused: bool, position: f64, duration: f64) -> SandboxMessage {
        SandboxMessage::PlaybackUpdate(PlaybackUpdate {
            paused: Some(paused),
            position: Some(position),
            duration: Some(duration),
            uri: None,
        })
    }

    #[test]
    fn loads_before_ready_are_deferred() {
        let mut controller = controller(None);
        assert_eq!(controller.phase(), BridgePhase::AwaitingReady);
        assert_eq!(controller.request_load("track:A".into()), None);
        assert_eq!(controller.request_load("track:B".into()), None);
        assert_eq!(controller.pending_content_id(), Some(&ContentId::new("track:B")));
        assert_eq!(controller.last_requested_content_id(), None);

        let command = controller.handle_message(SandboxMessage::Ready);
        assert!(matches!(
            command,
            Some(SandboxCommand::CreateController { ref uri, .. }) if uri == "track:B"
        ));
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
        assert_eq!(controller.pending_content_id(), None);
    }

    #[test]
    fn pending_request_wins_over_initial_content() {
        let mut controller = controller(Some("track:A"));
        controller.request_load("track:B".into());
        let command = controller.handle_message(SandboxMessage::Ready).unwrap();
        assert_eq!(command.target_uri(), Some("track:B"));
        assert_eq!(controller.state().current_content_id, "track:B");
    }

    #[test]
    fn ready_without_content_stays_idle() {
        let mut controller = controller(None);
        assert_eq!(controller.handle_message(SandboxMessage::Ready), None);
        assert!(controller.is_runtime_ready());
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);

        let command = controller.request_load("track:C".into()).unwrap();
        assert!(command.is_creation());
    }

    #[test]
    fn repeated_ready_is_ignored() {
        let mut controller = controller(Some("track:A"));
        assert!(controller.handle_message(SandboxMessage::Ready).is_some());
        assert_eq!(controller.handle_message(SandboxMessage::Ready), None);
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
    }

    #[test]
    fn requests_during_creation_never_create_twice() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        assert_eq!(controller.request_load("track:B".into()), None);
        assert_eq!(controller.request_load("track:C".into()), None);
        assert_eq!(controller.last_requested_content_id(), Some(&ContentId::new("track:C")));

        let command = controller.handle_message(SandboxMessage::ControllerCreated {
            created: true,
            message: None,
        });
        assert!(matches!(
            command,
            Some(SandboxCommand::LoadUri { ref uri, .. }) if uri == "track:C"
        ));
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
    }

    #[test]
    fn reverting_to_the_created_id_drops_the_pending_load() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        controller.request_load("track:B".into());
        controller.request_load("track:A".into());
        let command = controller.handle_message(SandboxMessage::ControllerCreated {
            created: true,
            message: None,
        });
        assert_eq!(command, None);
    }

    #[test]
    fn active_controller_loads_new_ids_and_skips_repeats() {
        let mut controller = active("track:A");
        let command = controller.request_load("track:B".into());
        assert!(matches!(command, Some(SandboxCommand::LoadUri { ref uri, .. }) if uri == "track:B"));
        assert_eq!(controller.request_load("track:B".into()), None);
        assert_eq!(controller.last_requested_content_id(), Some(&ContentId::new("track:B")));
        assert_eq!(controller.state().current_content_id, "track:B");
        assert_eq!(controller.request_load("track:A".into()).map(|c| c.is_creation()), Some(false));
    }

    #[test]
    fn playback_update_maps_milliseconds_to_seconds() {
        let mut controller = active("track:A");
        controller.handle_message(update(false, 12500.0, 245000.0));
        let state = controller.state();
        assert!(state.is_playing);
        assert_eq!(state.current_position_seconds, 12.5);
        assert_eq!(state.duration_seconds, 245.0);
    }

    #[test]
    fn zero_duration_does_not_clobber_known_duration() {
        let mut controller = active("track:B");
        controller.handle_message(update(false, 12500.0, 245000.0));
        controller.handle_message(update(true, 0.0, 0.0));
        let state = controller.state();
        assert!(!state.is_playing);
        assert_eq!(state.current_position_seconds, 0.0);
        assert_eq!(state.duration_seconds, 245.0);
    }

    #[test]
    fn negligible_position_changes_are_skipped_once_duration_is_known() {
        let mut controller = active("track:A");
        controller.handle_message(update(false, 10000.0, 200000.0));
        controller.handle_message(update(false, 10050.0, 200000.0));
        assert_eq!(controller.state().current_position_seconds, 10.0);
        controller.handle_message(update(false, 10300.0, 200000.0));
        assert_eq!(controller.state().current_position_seconds, 10.3);
    }

    #[test]
    fn errors_do_not_change_phase_and_updates_clear_them() {
        let mut controller = active("track:A");
        controller.handle_message(SandboxMessage::RuntimeError(RuntimeError::Account(
            "Account Error: Premium required".to_string(),
        )));
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some("Account Error: Premium required")
        );

        controller.handle_message(update(false, 1000.0, 5000.0));
        assert_eq!(controller.state().last_error, None);
        assert!(controller.state().is_playing);
    }

    #[test]
    fn errors_while_awaiting_ready_keep_waiting() {
        let mut controller = controller(Some("track:A"));
        controller.handle_raw_message(&json!({ "event": "error", "data": { "message": "Failed API script load" } }));
        assert_eq!(controller.phase(), BridgePhase::AwaitingReady);
        assert_eq!(controller.fatal_error(), Some(&TransportError::ApiScriptLoad));
        assert_eq!(controller.state().last_error.as_deref(), Some("Failed API script load"));
    }

    #[test]
    fn blocked_autoplay_is_retried_once_per_load() {
        let mut controller = active("track:A");
        let blocked = || SandboxMessage::RuntimeError(RuntimeError::AutoplayBlocked("Autoplay failed".to_string()));
        assert_eq!(controller.handle_message(blocked()), Some(SandboxCommand::Play));
        assert_eq!(controller.handle_message(blocked()), None);

        controller.request_load("track:B".into());
        assert_eq!(controller.handle_message(blocked()), Some(SandboxCommand::Play));
    }

    #[test]
    fn null_controller_clears_the_creation_marker() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        let command = controller.handle_message(SandboxMessage::ControllerCreated {
            created: false,
            message: None,
        });
        assert_eq!(command, None);
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
        assert_eq!(controller.last_requested_content_id(), None);
        assert_eq!(controller.pending_content_id(), Some(&ContentId::new("track:A")));
        assert_eq!(controller.state().current_content_id, "");
        assert!(controller.state().last_error.is_some());

        let retry = controller.request_load("track:A".into()).unwrap();
        assert!(retry.is_creation());
    }

    #[test]
    fn failed_creation_keeps_the_latest_request_queued() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        assert_eq!(controller.request_load("track:B".into()), None);
        let command = controller.handle_message(SandboxMessage::ControllerCreated {
            created: false,
            message: Some("createController callback received null controller".to_string()),
        });
        assert_eq!(command, None);
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
        assert_eq!(controller.pending_content_id(), Some(&ContentId::new("track:B")));
        assert_eq!(controller.state().current_content_id, "");

        let retry = controller.request_load("track:B".into()).unwrap();
        assert!(matches!(
            retry,
            SandboxCommand::CreateController { ref uri, .. } if uri == "track:B"
        ));
        assert_eq!(controller.pending_content_id(), None);
        assert_eq!(controller.state().current_content_id, "track:B");
    }

    #[test]
    fn failed_creation_script_keeps_the_absorbed_request() {
        let mut controller = controller(Some("track:A"));
        let command = controller.handle_message(SandboxMessage::Ready).unwrap();
        controller.request_load("track:C".into());
        controller.handle_execute_failure(&command, TransportError::Evaluation("boom".to_string()));
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
        assert_eq!(controller.pending_content_id(), Some(&ContentId::new("track:C")));
    }

    #[test]
    fn confirmed_creation_clears_the_previous_error() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        controller.handle_message(SandboxMessage::ControllerCreated {
            created: false,
            message: None,
        });
        assert!(controller.state().last_error.is_some());

        controller.request_load("track:A".into());
        controller.handle_message(SandboxMessage::ControllerCreated {
            created: true,
            message: None,
        });
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
        assert_eq!(controller.state().last_error, None);
    }

    #[test]
    fn failed_creation_script_allows_retry() {
        let mut controller = controller(Some("track:A"));
        let command = controller.handle_message(SandboxMessage::Ready).unwrap();
        controller.handle_execute_failure(&command, TransportError::Evaluation("boom".to_string()));
        assert_eq!(controller.phase(), BridgePhase::ControllerPending);
        assert_eq!(controller.fatal_error(), None);
        assert!(controller.request_load("track:A".into()).unwrap().is_creation());
    }

    #[test]
    fn failed_load_script_keeps_controller_active() {
        let mut controller = active("track:A");
        let command = controller.request_load("track:B".into()).unwrap();
        controller.handle_execute_failure(&command, TransportError::Evaluation("boom".to_string()));
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some("Script evaluation failed: boom")
        );
    }

    #[test]
    fn updates_may_arrive_before_creation_is_confirmed() {
        let mut controller = controller(Some("track:A"));
        controller.handle_message(SandboxMessage::Ready);
        controller.handle_message(update(false, 500.0, 180000.0));
        assert!(controller.state().is_playing);
        assert_eq!(controller.state().duration_seconds, 180.0);
    }

    #[test]
    fn reported_uri_keeps_the_marker_in_sync() {
        let mut controller = active("track:A");
        controller.handle_message(SandboxMessage::PlaybackUpdate(PlaybackUpdate {
            uri: Some("track:Z".to_string()),
            ..PlaybackUpdate::default()
        }));
        assert_eq!(controller.state().current_content_id, "track:Z");
        assert_eq!(controller.request_load("track:Z".into()), None);
    }

    #[test]
    fn play_and_pause_require_an_active_controller() {
        let mut controller = controller(Some("track:A"));
        assert_eq!(controller.play(), None);
        controller.handle_message(SandboxMessage::Ready);
        assert_eq!(controller.pause(), None);
        controller.handle_message(SandboxMessage::ControllerCreated {
            created: true,
            message: None,
        });
        assert_eq!(controller.play(), Some(SandboxCommand::Play));
        assert_eq!(controller.pause(), Some(SandboxCommand::Pause));
    }

    #[test]
    fn navigation_failures_are_recorded_as_fatal() {
        let mut controller = controller(Some("track:A"));
        controller.handle_surface_event(SurfaceEvent::NavigationFailed {
            provisional: true,
            reason: "offline".to_string(),
        });
        assert_eq!(
            controller.state().last_error.as_deref(),
            Some("Failed to start loading embed: offline")
        );
        assert!(controller.fatal_error().is_some());
        assert_eq!(controller.phase(), BridgePhase::AwaitingReady);
    }

    #[test]
    fn disposed_controller_ignores_everything() {
        let mut controller = active("track:A");
        controller.handle_message(update(false, 3000.0, 90000.0));
        let before = controller.state().clone();
        controller.dispose();

        assert_eq!(controller.handle_message(update(true, 0.0, 1000.0)), None);
        assert_eq!(controller.request_load("track:B".into()), None);
        controller.handle_transport_error(TransportError::Detached);
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn malformed_messages_are_ignored() {
        let mut controller = active("track:A");
        let before = controller.state().clone();
        assert_eq!(controller.handle_raw_message(&json!({ "event": "mystery" })), None);
        assert_eq!(controller.handle_raw_message(&json!([1, 2, 3])), None);
        assert_eq!(controller.state(), &before);
        assert_eq!(controller.phase(), BridgePhase::ControllerActive);
    }
}
