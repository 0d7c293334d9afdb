//! Sandbox host surface: the embedded script/rendering context hosting the
//! third-party widget, seen from the bridge as two primitives.
//!
//! - [`SandboxSurface::execute`] runs code inside the sandbox.
//! - [`SurfaceSender`] carries everything the sandbox posts back, in arrival
//!   order, onto the session's owner task regardless of which thread the
//!   surface received it on.

pub mod bootstrap;
pub mod encoder;
pub mod simulated;

use std::{future::Future, pin::Pin};

use serde_json::Value;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tunebridge_bridge::{error::TransportError, protocol::SurfaceEvent};

use crate::sandbox::bootstrap::BootstrapDocument;

/// Pending evaluation of one script, detached from the surface that
/// started it.
pub type Evaluation = Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'static>>;

/// An embedded script sandbox able to host the player widget.
///
/// Implementations receive a [`SurfaceSender`] when they are constructed and
/// must forward every posted payload, navigation failure and alert through it.
pub trait SandboxSurface: Send + 'static {
    /// Starts loading the bootstrap document. Completion and failures are
    /// reported asynchronously through the surface sender.
    fn load_document(&mut self, document: &BootstrapDocument) -> Result<(), TransportError>;

    /// Evaluates `script` in the sandbox's global scope.
    fn execute(&self, script: String) -> Evaluation;

    /// Stops forwarding sandbox messages. Called first during teardown.
    fn detach_listener(&mut self);

    /// Stops any loading and releases the sandbox.
    fn stop(&mut self);
}

/// Marshals sandbox notifications onto the session owner task.
#[derive(Debug, Clone)]
pub struct SurfaceSender {
    tx: Sender<SurfaceEvent>,
}

impl SurfaceSender {
    /// Creates a sender and the receiver the session consumes.
    pub fn channel(buffer: usize) -> (Self, Receiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Sends an event from async code.
    pub async fn post(&self, event: SurfaceEvent) -> Result<(), TransportError> {
        self.tx.send(event).await.map_err(|_| TransportError::Detached)
    }

    /// Sends an event from a thread outside the async runtime.
    pub fn post_blocking(&self, event: SurfaceEvent) -> Result<(), TransportError> {
        self.tx
            .blocking_send(event)
            .map_err(|_| TransportError::Detached)
    }

    /// Convenience for forwarding a posted payload.
    pub async fn post_message(&self, payload: Value) -> Result<(), TransportError> {
        self.post(SurfaceEvent::Message(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_threads_post_in_order() {
        let (sender, mut rx) = SurfaceSender::channel(4);
        std::thread::spawn(move || {
            sender.post_blocking(SurfaceEvent::DocumentLoaded).unwrap();
            sender
                .post_blocking(SurfaceEvent::Alert("hello".to_string()))
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(rx.blocking_recv(), Some(SurfaceEvent::DocumentLoaded));
        assert_eq!(rx.blocking_recv(), Some(SurfaceEvent::Alert("hello".to_string())));
        assert_eq!(rx.blocking_recv(), None);
    }
}
