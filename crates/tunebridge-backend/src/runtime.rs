//! Backend runtime setup and orchestration.
//!
//! This module wires together configuration and the loop that starts one
//! bridge session per player the host view mounts.

use std::thread;

use tokio::{
    sync::mpsc::Receiver,
    task::{JoinError, JoinSet},
};
use tunebridge_bridge::{SessionRequest, config::Config};

use crate::{
    sandbox::simulated::{SimulatedSandbox, SimulationOptions},
    session::spawn_session,
};

/// Running bridge sessions. Finished ones are reaped as they end.
struct SessionPool {
    config: Config,
    simulation: SimulationOptions,
    sessions: JoinSet<Result<(), JoinError>>,
}

impl SessionPool {
    fn new(config: Config, simulation: SimulationOptions) -> Self {
        Self {
            config,
            simulation,
            sessions: JoinSet::new(),
        }
    }

    fn start(&mut self, request: SessionRequest) {
        log::debug!("Starting a bridge session for {:?}", request.initial);
        let simulation = self.simulation.clone();
        self.sessions.spawn(spawn_session(
            self.config.clone(),
            request.initial,
            request.endpoint,
            move |events| SimulatedSandbox::new(events, simulation),
        ));
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Waits for one session to end. Returns `None` when none are running.
    async fn reap_next(&mut self) -> Option<()> {
        let finished = self.sessions.join_next().await?;
        match finished.and_then(|session| session) {
            Ok(()) => log::debug!("Bridge session finished, {} still running.", self.len()),
            Err(e) => log::error!("Bridge session ended abnormally: {e}"),
        }
        Some(())
    }
}

/// Starts a session for every request until the host closes the channel,
/// then waits for the running sessions to be torn down.
async fn setup_backend(
    config: Option<Config>,
    simulation: SimulationOptions,
    mut rx: Receiver<SessionRequest>,
) {
    let config = match config {
        Some(config) => config,
        None => crate::config::load_config().await.unwrap_or_else(|e| {
            log::warn!("Using default configuration: {e}");
            Config::default()
        }),
    };

    let mut pool = SessionPool::new(config, simulation);
    loop {
        tokio::select! {
            request = rx.recv() => match request {
                Some(request) => pool.start(request),
                None => break,
            },
            Some(()) = pool.reap_next() => {}
        }
    }

    while pool.reap_next().await.is_some() {}
    log::info!("Backend stopped.");
}

/// Spawns the backend runtime on its own thread and begins serving session
/// requests. With `config` unset the configuration is loaded from disk.
pub fn run(
    config: Option<Config>,
    simulation: SimulationOptions,
    rx: Receiver<SessionRequest>,
) -> std::io::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(thread::spawn(move || {
        runtime.block_on(setup_backend(config, simulation, rx));
    }))
}
