//! Session runtime: the single owner task behind one displayed player.
//!
//! The task owns the [`BridgeController`] and the sandbox surface. Host
//! commands, marshaled surface events and completed `execute` calls are all
//! consumed here, so every state transition and every [`PlaybackState`] write
//! happens on one task. Snapshots are published through the endpoint's watch
//! channel after each input.

use std::time::Duration;

use serde_json::Value;
use tokio::{
    sync::{
        mpsc::{Receiver, Sender, error::TrySendError},
        watch,
    },
    task::{JoinError, JoinHandle, JoinSet},
};
use tunebridge_bridge::{
    BridgePhase, ControllerEndpoint, MessageFromController, MessageToController,
    config::Config,
    content::ContentId,
    error::TransportError,
    notification::{NotificationMessage, NotificationType},
    playback::PlaybackState,
    protocol::{SandboxCommand, SurfaceEvent},
};

use crate::{
    controller::BridgeController,
    sandbox::{
        SandboxSurface, SurfaceSender,
        bootstrap::BootstrapDocument,
        encoder::{CommandEncoder, DispatchEncoder},
    },
};

type Execution = (SandboxCommand, Result<Value, TransportError>);

/// Starts a session on the current tokio runtime.
///
/// `make_surface` receives the sender the surface must forward its events
/// through. The returned handle completes once the session has been torn
/// down, either because the host sent [`MessageToController::Dispose`] or
/// because the host endpoint was dropped.
pub fn spawn_session<S, F>(
    config: Config,
    initial: Option<ContentId>,
    endpoint: ControllerEndpoint,
    make_surface: F,
) -> JoinHandle<()>
where
    S: SandboxSurface,
    F: FnOnce(SurfaceSender) -> S + Send + 'static,
{
    tokio::spawn(async move {
        let (events_tx, events_rx) = SurfaceSender::channel(config.session.channel_buffer);
        let surface = make_surface(events_tx);
        let ControllerEndpoint {
            from_host,
            to_host,
            state,
        } = endpoint;

        let session = SessionContext::new(&config, initial, surface, to_host, state);
        session.run(from_host, events_rx).await;
    })
}

/// Everything one session task owns.
struct SessionContext<S: SandboxSurface> {
    controller: BridgeController,
    surface: S,
    encoder: DispatchEncoder,
    document: BootstrapDocument,
    /// Outbound lifecycle channel to the host.
    tx: Sender<MessageFromController>,
    /// Publisher of playback snapshots.
    state: watch::Sender<PlaybackState>,
    in_flight: JoinSet<Execution>,
    phase: BridgePhase,
    reported_error: Option<String>,
    ready_warning: Duration,
}

impl<S: SandboxSurface> SessionContext<S> {
    fn new(
        config: &Config,
        initial: Option<ContentId>,
        surface: S,
        tx: Sender<MessageFromController>,
        state: watch::Sender<PlaybackState>,
    ) -> Self {
        let controller = BridgeController::new(config, initial);
        Self {
            phase: controller.phase(),
            controller,
            surface,
            encoder: DispatchEncoder::default(),
            document: BootstrapDocument::render(&config.embed),
            tx,
            state,
            in_flight: JoinSet::new(),
            reported_error: None,
            ready_warning: Duration::from_secs(config.session.ready_warning_after_seconds),
        }
    }

    /// Loads the bootstrap document, then consumes every input until the
    /// host disposes the session.
    async fn run(
        mut self,
        mut from_host: Receiver<MessageToController>,
        mut events: Receiver<SurfaceEvent>,
    ) {
        self.load_bootstrap();
        self.publish();

        let watchdog = tokio::time::sleep(self.ready_warning);
        tokio::pin!(watchdog);
        let mut warned = false;

        loop {
            tokio::select! {
                message = from_host.recv() => match message {
                    Some(MessageToController::Dispose) => break,
                    Some(message) => {
                        log::debug!("Got a host message: {message:?}");
                        self.dispatch_message(message);
                    }
                    None => {
                        log::info!("Host endpoint dropped, ending bridge session.");
                        break;
                    }
                },
                event = events.recv() => match event {
                    Some(event) => {
                        let command = self.controller.handle_surface_event(event);
                        self.execute(command);
                    }
                    None => {
                        log::warn!("Sandbox surface closed its event channel.");
                        break;
                    }
                },
                Some(result) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_executed(result);
                }
                () = &mut watchdog, if !warned && self.controller.phase() == BridgePhase::AwaitingReady => {
                    warned = true;
                    log::warn!(
                        "Embed API has not signalled readiness after {}s, still waiting.",
                        self.ready_warning.as_secs()
                    );
                    self.send_notification(NotificationType::Warning, "Player is taking long to load");
                }
            }
            self.publish();
        }

        self.teardown().await;
    }

    fn load_bootstrap(&mut self) {
        self.controller.begin_loading();
        match self.surface.load_document(&self.document) {
            Ok(()) => log::info!("Loading embed bootstrap document."),
            Err(e) => self.controller.handle_transport_error(e),
        }
    }

    /// Routes a host command to the controller.
    fn dispatch_message(&mut self, message: MessageToController) {
        let command = match message {
            MessageToController::RequestLoad(id) => self.controller.request_load(id),
            MessageToController::Play => self.controller.play(),
            MessageToController::Pause => self.controller.pause(),
            MessageToController::Dispose => None,
        };
        self.execute(command);
    }

    /// Hands a command to the sandbox without waiting for it to finish.
    fn execute(&mut self, command: Option<SandboxCommand>) {
        let Some(command) = command else {
            return;
        };
        let script = match self.encoder.encode(&command) {
            Ok(script) => script,
            Err(e) => {
                log::error!("Could not encode {command:?}: {e}");
                self.controller
                    .handle_execute_failure(&command, TransportError::Evaluation(e.to_string()));
                return;
            }
        };

        log::debug!("Executing {command:?} in the sandbox.");
        let evaluation = self.surface.execute(script);
        self.in_flight
            .spawn(async move { (command, evaluation.await) });
    }

    fn on_executed(&mut self, result: Result<Execution, JoinError>) {
        match result {
            Ok((command, Ok(_))) => log::debug!("Sandbox evaluated {command:?}."),
            Ok((command, Err(e))) => self.controller.handle_execute_failure(&command, e),
            Err(e) if e.is_cancelled() => {}
            Err(e) => log::error!("Sandbox evaluation task failed: {e}"),
        }
    }

    /// Reports phase changes, then pushes the latest snapshot to observers
    /// and reports new errors to the host. The phase goes out first so a host
    /// woken by the snapshot already has it queued.
    fn publish(&mut self) {
        let phase = self.controller.phase();
        if phase != self.phase {
            log::info!("Bridge session phase {:?} -> {phase:?}.", self.phase);
            self.phase = phase;
            self.send(MessageFromController::PhaseChanged(phase));
            if phase == BridgePhase::ControllerActive {
                self.send_notification(NotificationType::Success, "Player ready");
            }
        }

        let snapshot = self.controller.state();
        self.state.send_if_modified(|current| {
            if current == snapshot {
                return false;
            }
            *current = snapshot.clone();
            true
        });

        let error = self.controller.state().last_error.clone();
        if error != self.reported_error {
            if let Some(message) = &error {
                self.send_notification(NotificationType::Error, message.clone());
            }
            self.reported_error = error;
        }
    }

    /// Cancels in-flight evaluations, detaches the listener and releases the
    /// sandbox, in that order.
    async fn teardown(mut self) {
        log::info!("Tearing down bridge session.");
        self.controller.dispose();
        self.in_flight.abort_all();
        self.surface.detach_listener();
        self.surface.stop();
        self.in_flight.shutdown().await;
        self.send(MessageFromController::SessionClosed);
    }

    /// Sends a lifecycle message to the host. Messages are dropped when the
    /// host is not keeping up so the owner task never stalls on it.
    fn send(&self, message: MessageFromController) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                log::warn!("Host is not draining lifecycle messages, dropped {message:?}.");
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("Host endpoint closed, lifecycle message not delivered.");
            }
        }
    }

    fn send_notification(&self, notification_type: NotificationType, content: impl Into<String>) {
        self.send(MessageFromController::NotificationMessage(
            NotificationMessage::new(notification_type, content),
        ));
    }
}
