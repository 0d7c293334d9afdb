//! Communication bridge between the host view, the bridge controller and the
//! embedded player sandbox.
//!
//! This crate defines the types and protocols shared by every party involved
//! in driving a third-party playback widget that lives inside an isolated
//! script sandbox:
//! - The host view sends commands (load a content identifier, play, pause,
//!   dispose) to the controller.
//! - The controller pushes lifecycle events and notifications back, and
//!   publishes [`playback::PlaybackState`] snapshots through a watch channel.
//! - The sandbox surface forwards raw [`protocol::SurfaceEvent`]s which the
//!   controller parses into typed [`protocol::SandboxMessage`]s.
//!
//! Host/controller communication happens over bounded [`tokio::sync::mpsc`]
//! channels wrapped in [`BridgeChannels`].

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod notification;
pub mod playback;
pub mod protocol;

use tokio::sync::{
    mpsc::{self, Receiver, Sender},
    watch,
};

use crate::content::ContentId;
use crate::playback::PlaybackState;

/// Observable lifecycle phase of a bridge session.
///
/// The phase only ever moves forward. `ControllerActive` may re-enter itself
/// on subsequent loads but never returns to `ControllerPending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgePhase {
    /// The bootstrap document has not been handed to the sandbox yet.
    Uninitialized,
    /// The bootstrap document is loading; the third-party API has not
    /// announced readiness.
    AwaitingReady,
    /// The API is ready; the player controller is being created (or there is
    /// nothing to create yet).
    ControllerPending,
    /// The player controller exists inside the sandbox.
    ControllerActive,
}

/// Messages emitted by the controller to inform the host of lifecycle changes.
///
/// Playback data itself is not sent here; it is published through the state
/// watch channel (see [`HostEndpoint::state`]).
#[derive(Debug, Clone)]
pub enum MessageFromController {
    /// The session moved to a new phase.
    PhaseChanged(BridgePhase),
    /// Generic user-facing notification (errors, readiness, teardown).
    NotificationMessage(notification::NotificationMessage),
    /// The session has been torn down; no further messages will follow.
    SessionClosed,
}

/// Commands issued by the host to drive the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageToController {
    /// Load the given content identifier, creating the player controller if
    /// it does not exist yet.
    RequestLoad(ContentId),
    /// Resume playback of the loaded content.
    Play,
    /// Pause playback of the loaded content.
    Pause,
    /// Permanently end the session.
    Dispose,
}

/// Host side of a [`BridgeChannels`] pair.
#[derive(Debug)]
pub struct HostEndpoint {
    /// Sender used by the host to send commands to the controller.
    pub to_controller: Sender<MessageToController>,
    /// Receiver used by the host to get lifecycle messages.
    pub from_controller: Receiver<MessageFromController>,
    /// Latest playback snapshot, updated by the controller only.
    pub state: watch::Receiver<PlaybackState>,
}

/// Controller side of a [`BridgeChannels`] pair.
#[derive(Debug)]
pub struct ControllerEndpoint {
    /// Receiver used by the controller to get commands from the host.
    pub from_host: Receiver<MessageToController>,
    /// Sender used by the controller to push lifecycle messages.
    pub to_host: Sender<MessageFromController>,
    /// Publisher of playback snapshots.
    pub state: watch::Sender<PlaybackState>,
}

/// Paired `tokio` channels connecting one host view with one controller.
#[derive(Debug)]
pub struct BridgeChannels {
    /// Endpoint owned by the host view binding.
    pub host: HostEndpoint,
    /// Endpoint owned by the controller session.
    pub controller: ControllerEndpoint,
}

impl BridgeChannels {
    /// Creates a new pair of bridged channels with the given buffer capacity.
    pub fn new(buffer: usize) -> Self {
        let (to_controller_tx, to_controller_rx) = mpsc::channel(buffer);
        let (to_host_tx, to_host_rx) = mpsc::channel(buffer);
        let (state_tx, state_rx) = watch::channel(PlaybackState::default());
        Self {
            host: HostEndpoint {
                to_controller: to_controller_tx,
                from_controller: to_host_rx,
                state: state_rx,
            },
            controller: ControllerEndpoint {
                from_host: to_controller_rx,
                to_host: to_host_tx,
                state: state_tx,
            },
        }
    }
}

impl Default for BridgeChannels {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Asks the backend to start a bridge session for one displayed player.
#[derive(Debug)]
pub struct SessionRequest {
    /// Content the player should show once the embed API is ready.
    pub initial: Option<ContentId>,
    /// Controller side of the channels the host view keeps the other end of.
    pub endpoint: ControllerEndpoint,
}
