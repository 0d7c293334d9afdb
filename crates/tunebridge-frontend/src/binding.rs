//! Host view binding: the host-side half of one bridge session.
//!
//! A binding is created per visible player. It supplies the initially
//! desired content, forwards selection changes as load requests and exposes
//! the published [`PlaybackState`] for rendering. It never talks to the
//! sandbox directly. Dropping the binding disposes the session.

use anyhow::{Context, anyhow};
use tokio::sync::{
    mpsc::{
        Receiver, Sender,
        error::{TryRecvError, TrySendError},
    },
    watch,
};
use tunebridge_bridge::{
    BridgeChannels, BridgePhase, HostEndpoint, MessageFromController, MessageToController,
    SessionRequest, content::ContentId, error::BridgeError, notification::NotificationMessage,
    playback::PlaybackState,
};

use crate::{presentation::PlayerPresentation, theme::Theme};

#[derive(Debug)]
pub struct PlayerBinding {
    to_controller: Sender<MessageToController>,
    /// `None` once a task took over draining lifecycle messages.
    from_controller: Option<Receiver<MessageFromController>>,
    state: watch::Receiver<PlaybackState>,
    selected: Option<ContentId>,
    phase: BridgePhase,
    closed: bool,
    disposed: bool,
}

impl PlayerBinding {
    /// Asks the backend for a new session and binds to its host endpoint.
    pub fn mount(
        backend: &Sender<SessionRequest>,
        initial: Option<ContentId>,
        buffer: usize,
    ) -> anyhow::Result<Self> {
        let BridgeChannels { host, controller } = BridgeChannels::new(buffer);
        backend
            .try_send(SessionRequest {
                initial: initial.clone(),
                endpoint: controller,
            })
            .map_err(|e| anyhow!("failed to request a bridge session: {e}"))?;
        Ok(Self::new(host, initial))
    }

    /// Binds to an already running session.
    pub fn new(host: HostEndpoint, initial: Option<ContentId>) -> Self {
        let HostEndpoint {
            to_controller,
            from_controller,
            state,
        } = host;
        Self {
            to_controller,
            from_controller: Some(from_controller),
            state,
            selected: initial,
            phase: BridgePhase::Uninitialized,
            closed: false,
            disposed: false,
        }
    }

    /// The externally selected content changed. Only a different identifier
    /// is forwarded; returns whether a load was requested.
    pub fn select(&mut self, id: ContentId) -> anyhow::Result<bool> {
        if self.selected.as_ref() == Some(&id) {
            return Ok(false);
        }
        self.send(MessageToController::RequestLoad(id.clone()))
            .with_context(|| format!("failed to request {id}"))?;
        self.selected = Some(id);
        Ok(true)
    }

    /// Asks for the current selection again, even if it was already
    /// requested. Used after a failed creation; returns whether anything was
    /// selected.
    pub fn reload(&self) -> anyhow::Result<bool> {
        let Some(id) = self.selected.clone() else {
            return Ok(false);
        };
        self.send(MessageToController::RequestLoad(id.clone()))
            .with_context(|| format!("failed to request {id} again"))?;
        Ok(true)
    }

    pub fn play(&self) -> anyhow::Result<()> {
        self.send(MessageToController::Play)
    }

    pub fn pause(&self) -> anyhow::Result<()> {
        self.send(MessageToController::Pause)
    }

    /// Pauses when playing, plays otherwise.
    pub fn toggle_playback(&self) -> anyhow::Result<()> {
        if self.state.borrow().is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// A receiver that wakes whenever the session publishes a new snapshot.
    pub fn observe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn selected(&self) -> Option<&ContentId> {
        self.selected.as_ref()
    }

    /// Last phase reported by the session, as of the latest handled
    /// lifecycle message.
    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    /// Whether the session has been torn down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Hands the lifecycle receiver to a task that waits on it. Every
    /// received message must be fed back through [`Self::handle_message`].
    pub fn take_messages(&mut self) -> Option<Receiver<MessageFromController>> {
        self.from_controller.take()
    }

    /// Applies one lifecycle message and returns it if it is a notification.
    pub fn handle_message(&mut self, message: MessageFromController) -> Option<NotificationMessage> {
        match message {
            MessageFromController::PhaseChanged(phase) => self.phase = phase,
            MessageFromController::NotificationMessage(notification) => {
                log::debug!("Player notification: {}", notification.message);
                return Some(notification);
            }
            MessageFromController::SessionClosed => self.closed = true,
        }
        None
    }

    /// Drains lifecycle messages without waiting and returns the
    /// notifications among them. Does nothing once the receiver was taken.
    pub fn poll_messages(&mut self) -> Vec<NotificationMessage> {
        let mut notifications = Vec::new();
        while let Some(from_controller) = self.from_controller.as_mut() {
            match from_controller.try_recv() {
                Ok(message) => notifications.extend(self.handle_message(message)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        notifications
    }

    /// Text for the player card in the given skin.
    pub fn present(&self, theme: &Theme) -> PlayerPresentation {
        PlayerPresentation::new(&self.state.borrow(), self.phase, theme)
    }

    /// Ends the session. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Err(e) = self.to_controller.try_send(MessageToController::Dispose) {
            // a closed channel means the session is already gone
            log::debug!("Dispose not delivered: {e}");
        }
    }

    fn send(&self, message: MessageToController) -> anyhow::Result<()> {
        if self.disposed {
            return Err(BridgeError::SessionClosed.into());
        }
        self.to_controller
            .try_send(message)
            .map_err(|e| match e {
                TrySendError::Full(_) => anyhow!("bridge session is not keeping up"),
                TrySendError::Closed(_) => BridgeError::SessionClosed.into(),
            })
    }
}

impl Drop for PlayerBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;
    use tunebridge_bridge::{ControllerEndpoint, notification::NotificationType};

    use super::*;

    fn bound(initial: Option<&str>) -> (PlayerBinding, ControllerEndpoint) {
        let channels = BridgeChannels::new(8);
        let binding = PlayerBinding::new(channels.host, initial.map(ContentId::new));
        (binding, channels.controller)
    }

    #[test]
    fn only_changed_selections_are_forwarded() {
        let (mut binding, mut controller) = bound(Some("track:A"));
        assert!(!binding.select("track:A".into()).unwrap());
        assert!(controller.from_host.try_recv().is_err());

        assert!(binding.select("track:B".into()).unwrap());
        assert!(!binding.select("track:B".into()).unwrap());
        assert_eq!(
            controller.from_host.try_recv().unwrap(),
            MessageToController::RequestLoad("track:B".into())
        );
        assert!(controller.from_host.try_recv().is_err());
        assert_eq!(binding.selected(), Some(&ContentId::new("track:B")));
    }

    #[test]
    fn reload_repeats_the_current_selection() {
        let (mut binding, mut controller) = bound(Some("track:A"));
        assert!(binding.reload().unwrap());
        assert!(binding.reload().unwrap());
        for _ in 0..2 {
            assert_eq!(
                controller.from_host.try_recv().unwrap(),
                MessageToController::RequestLoad("track:A".into())
            );
        }

        binding.select("track:B".into()).unwrap();
        controller.from_host.try_recv().unwrap();
        binding.reload().unwrap();
        assert_eq!(
            controller.from_host.try_recv().unwrap(),
            MessageToController::RequestLoad("track:B".into())
        );
    }

    #[test]
    fn reload_without_a_selection_sends_nothing() {
        let (binding, mut controller) = bound(None);
        assert!(!binding.reload().unwrap());
        assert!(controller.from_host.try_recv().is_err());
    }

    #[test]
    fn taken_receiver_delivers_phase_changes_without_state_changes() {
        let (mut binding, controller) = bound(Some("track:A"));
        let mut messages = binding.take_messages().unwrap();
        assert!(binding.take_messages().is_none());

        controller
            .to_host
            .try_send(MessageFromController::PhaseChanged(BridgePhase::ControllerActive))
            .unwrap();
        assert!(binding.poll_messages().is_empty());
        assert!(!binding.observe().has_changed().unwrap());

        let message = messages.try_recv().unwrap();
        assert_eq!(binding.handle_message(message), None);
        assert_eq!(binding.phase(), BridgePhase::ControllerActive);
        assert!(binding.present(&Theme::RETRO_EIGHTIES).controls_enabled);
    }

    #[test]
    fn toggle_follows_the_published_state() {
        let (binding, mut controller) = bound(Some("track:A"));
        binding.toggle_playback().unwrap();
        assert_eq!(controller.from_host.try_recv().unwrap(), MessageToController::Play);

        controller.state.send_modify(|state| state.is_playing = true);
        binding.toggle_playback().unwrap();
        assert_eq!(controller.from_host.try_recv().unwrap(), MessageToController::Pause);
    }

    #[test]
    fn lifecycle_messages_update_the_binding() {
        let (mut binding, controller) = bound(None);
        let to_host = &controller.to_host;
        to_host
            .try_send(MessageFromController::PhaseChanged(BridgePhase::ControllerActive))
            .unwrap();
        to_host
            .try_send(MessageFromController::NotificationMessage(NotificationMessage::new(
                NotificationType::Error,
                "Autoplay failed",
            )))
            .unwrap();

        let notifications = binding.poll_messages();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Autoplay failed");
        assert_eq!(binding.phase(), BridgePhase::ControllerActive);
        assert!(!binding.is_closed());

        to_host.try_send(MessageFromController::SessionClosed).unwrap();
        binding.poll_messages();
        assert!(binding.is_closed());
    }

    #[test]
    fn presentation_reads_the_latest_snapshot() {
        let (mut binding, controller) = bound(Some("track:A"));
        controller.state.send_modify(|state| {
            state.is_playing = true;
            state.current_position_seconds = 12.5;
            state.duration_seconds = 245.0;
        });
        controller
            .to_host
            .try_send(MessageFromController::PhaseChanged(BridgePhase::ControllerActive))
            .unwrap();
        binding.poll_messages();

        let presentation = binding.present(&Theme::RETRO_EIGHTIES);
        assert_eq!(presentation.status, "NOW PLAYING");
        assert_eq!(presentation.time, "0:12 / 4:05");
        assert!(binding.snapshot().is_playing);
    }

    #[test]
    fn dropping_the_binding_disposes_once() {
        let (mut binding, mut controller) = bound(Some("track:A"));
        binding.dispose();
        let error = binding.select("track:B".into()).unwrap_err();
        assert_eq!(
            error.root_cause().downcast_ref::<BridgeError>(),
            Some(&BridgeError::SessionClosed)
        );
        drop(binding);

        assert_eq!(controller.from_host.try_recv().unwrap(), MessageToController::Dispose);
        assert!(controller.from_host.try_recv().is_err());
    }

    #[test]
    fn mount_hands_the_controller_end_to_the_backend() {
        let (backend, mut requests) = mpsc::channel(1);
        let binding = PlayerBinding::mount(&backend, Some("track:A".into()), 8).unwrap();

        let request = requests.try_recv().unwrap();
        assert_eq!(request.initial, Some(ContentId::new("track:A")));
        drop(binding);

        let mut endpoint = request.endpoint;
        assert_eq!(endpoint.from_host.try_recv().unwrap(), MessageToController::Dispose);
    }
}
