//! In-process stand-in for a web view hosting the embed widget.
//!
//! The simulated sandbox understands the dispatcher calls produced by
//! [`DispatchEncoder`] and answers the way the bootstrap document and the
//! third-party widget would: a ready signal after a delay, `controllerCreated`
//! after creation, periodic `playbackUpdate`s while playing, and `error`
//! reports for the usual failure modes. Used by the demo binary and tests.

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tunebridge_bridge::{
    error::TransportError,
    protocol::{READY_SIGNAL, SandboxCommand, SurfaceEvent},
};

use crate::sandbox::{
    Evaluation, SandboxSurface, SurfaceSender, bootstrap::BootstrapDocument,
    encoder::DispatchEncoder,
};

/// Knobs controlling how the simulated widget behaves.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    /// Time between loading the bootstrap document and the ready signal.
    pub ready_delay: Duration,
    /// Interval between playback updates while playing.
    pub tick_interval: Duration,
    /// Duration reported for every loaded identifier, in milliseconds.
    pub track_duration_ms: u64,
    /// Report the embed API script as unreachable instead of becoming ready.
    pub fail_api_script: bool,
    /// Fail navigation of the bootstrap document with this reason.
    pub fail_navigation: Option<String>,
    /// Refuse the first play attempt with an `autoplay_failed` report.
    pub block_first_autoplay: bool,
    /// Answer creation with a null controller.
    pub null_controller: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            ready_delay: Duration::from_millis(300),
            tick_interval: Duration::from_secs(1),
            track_duration_ms: 180_000,
            fail_api_script: false,
            fail_navigation: None,
            block_first_autoplay: false,
            null_controller: false,
        }
    }
}

#[derive(Debug, Clone)]
struct SimulatedPlayer {
    uri: String,
    paused: bool,
    position_ms: u64,
    duration_ms: u64,
}

impl SimulatedPlayer {
    fn snapshot(&self) -> Value {
        json!({
            "event": "playbackUpdate",
            "data": {
                "paused": self.paused,
                "position": self.position_ms,
                "duration": self.duration_ms,
                "uri": self.uri,
            }
        })
    }
}

#[derive(Debug)]
struct Inner {
    events: SurfaceSender,
    options: SimulationOptions,
    attached: AtomicBool,
    api_ready: AtomicBool,
    autoplay_blocked: AtomicBool,
    ticker_started: AtomicBool,
    player: Mutex<Option<SimulatedPlayer>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Sandbox surface emulating the embed runtime without a script engine.
#[derive(Debug)]
pub struct SimulatedSandbox {
    inner: Arc<Inner>,
    encoder: DispatchEncoder,
}

impl SimulatedSandbox {
    pub fn new(events: SurfaceSender, options: SimulationOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                events,
                options,
                attached: AtomicBool::new(true),
                api_ready: AtomicBool::new(false),
                autoplay_blocked: AtomicBool::new(false),
                ticker_started: AtomicBool::new(false),
                player: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
            }),
            encoder: DispatchEncoder::default(),
        }
    }
}

impl SandboxSurface for SimulatedSandbox {
    fn load_document(&mut self, document: &BootstrapDocument) -> Result<(), TransportError> {
        let container = format!("id=\"{}\"", document.container_id());
        if !document.html().contains(&container) {
            return Err(TransportError::DocumentLoad(
                "bootstrap document has no player container".to_string(),
            ));
        }

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            if let Some(reason) = inner.options.fail_navigation.clone() {
                inner
                    .post(SurfaceEvent::NavigationFailed {
                        provisional: true,
                        reason,
                    })
                    .await;
                return;
            }

            tokio::time::sleep(inner.options.ready_delay).await;
            inner.post(SurfaceEvent::DocumentLoaded).await;
            if inner.options.fail_api_script {
                inner
                    .emit(json!({
                        "event": "error",
                        "data": { "kind": "script_load", "message": "Failed API script load" }
                    }))
                    .await;
            } else {
                inner.api_ready.store(true, Ordering::Release);
                inner.emit(Value::String(READY_SIGNAL.to_string())).await;
            }
        });
        self.inner.track(task);
        Ok(())
    }

    fn execute(&self, script: String) -> Evaluation {
        let inner = self.inner.clone();
        let command = self.encoder.decode(&script);
        Box::pin(async move {
            let command = command.map_err(|e| TransportError::Evaluation(e.to_string()))?;
            inner.apply(command).await
        })
    }

    fn detach_listener(&mut self) {
        self.inner.attached.store(false, Ordering::Release);
    }

    fn stop(&mut self) {
        for task in self.inner.tasks().drain(..) {
            task.abort();
        }
        self.inner.player().take();
    }
}

impl Inner {
    fn player(&self) -> MutexGuard<'_, Option<SimulatedPlayer>> {
        self.player.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks();
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    async fn post(&self, event: SurfaceEvent) {
        if !self.is_attached() {
            return;
        }
        if let Err(e) = self.events.post(event).await {
            log::debug!("Simulated sandbox could not post: {e}");
        }
    }

    async fn emit(&self, payload: Value) {
        self.post(SurfaceEvent::Message(payload)).await;
    }

    async fn report(&self, kind: &str, message: &str) {
        self.emit(json!({ "event": "error", "data": { "kind": kind, "message": message } }))
            .await;
    }

    async fn apply(self: Arc<Self>, command: SandboxCommand) -> Result<Value, TransportError> {
        if !self.is_attached() {
            return Err(TransportError::Detached);
        }

        match command {
            SandboxCommand::CreateController { uri, autoplay, .. } => {
                if !self.api_ready.load(Ordering::Acquire) {
                    self.report("controller_missing", "Embed API not loaded").await;
                    return Ok(Value::Null);
                }
                if self.options.null_controller {
                    self.emit(json!({
                        "event": "controllerCreated",
                        "data": { "created": false, "message": "createController callback received null controller" }
                    }))
                    .await;
                    return Ok(Value::Null);
                }

                *self.player() = Some(SimulatedPlayer {
                    uri,
                    paused: true,
                    position_ms: 0,
                    duration_ms: self.options.track_duration_ms,
                });
                self.emit(json!({ "event": "controllerCreated", "data": { "created": true } }))
                    .await;
                self.clone().ensure_ticker();
                if autoplay {
                    self.start_playback().await;
                }
            }
            SandboxCommand::LoadUri {
                uri,
                autoplay,
                autoplay_delay_ms,
            } => {
                let snapshot = self.player().as_mut().map(|player| {
                    player.uri = uri;
                    player.position_ms = 0;
                    player.duration_ms = self.options.track_duration_ms;
                    player.snapshot()
                });
                let Some(snapshot) = snapshot else {
                    self.report("controller_missing", "Controller not found for loadUri operation")
                        .await;
                    return Ok(Value::Null);
                };
                self.emit(snapshot).await;
                if autoplay {
                    tokio::time::sleep(Duration::from_millis(autoplay_delay_ms)).await;
                    self.start_playback().await;
                }
            }
            SandboxCommand::Play => self.start_playback().await,
            SandboxCommand::Pause => {
                let snapshot = self.player().as_mut().map(|player| {
                    player.paused = true;
                    player.snapshot()
                });
                if let Some(snapshot) = snapshot {
                    self.emit(snapshot).await;
                }
            }
        }
        Ok(Value::Null)
    }

    async fn start_playback(&self) {
        if self.options.block_first_autoplay && !self.autoplay_blocked.swap(true, Ordering::AcqRel) {
            self.report("autoplay_failed", "Autoplay failed").await;
            return;
        }
        let snapshot = self.player().as_mut().map(|player| {
            player.paused = false;
            player.snapshot()
        });
        if let Some(snapshot) = snapshot {
            self.emit(snapshot).await;
        }
    }

    fn ensure_ticker(self: Arc<Self>) {
        if self.ticker_started.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = self.clone();
        let task = tokio::spawn(async move {
            let tick = inner.options.tick_interval;
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                if !inner.is_attached() {
                    break;
                }
                let snapshot = inner.player().as_mut().and_then(|player| {
                    if player.paused {
                        return None;
                    }
                    player.position_ms =
                        (player.position_ms + tick.as_millis() as u64).min(player.duration_ms);
                    if player.position_ms >= player.duration_ms {
                        player.paused = true;
                    }
                    Some(player.snapshot())
                });
                if let Some(snapshot) = snapshot {
                    inner.emit(snapshot).await;
                }
            }
        });
        self.track(task);
    }
}
