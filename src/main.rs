use tunebridge_backend::sandbox::simulated::SimulationOptions;
use tunebridge_bridge::{catalog::StaticCatalog, config::Config};
use tunebridge_frontend::{BackendBridge, theme::Theme};

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .init()?;

    let config = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tunebridge_backend::config::load_config())
        .unwrap_or_else(|e| {
            log::warn!("Using default configuration: {e}");
            Config::default()
        });

    let buffer = config.session.channel_buffer;
    let (to_backend, requests) = tokio::sync::mpsc::channel(buffer);
    let _backend = tunebridge_backend::run(Some(config), SimulationOptions::default(), requests)?;

    let bridge = BackendBridge {
        to_backend,
        channel_buffer: buffer,
    };
    tunebridge_frontend::run(bridge, StaticCatalog::demo(), Theme::ALL.to_vec())
}
