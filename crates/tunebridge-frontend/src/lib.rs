use gpui::{AppContext, Application, Global, WindowOptions};
use gpui_component::Root;
use tokio::sync::mpsc;
use tunebridge_bridge::{
    SessionRequest,
    catalog::{CatalogItem, StaticCatalog},
    content::ContentId,
};

use crate::{
    binding::PlayerBinding,
    entities::{DataEntities, player_entity::PlayerEntity},
    theme::Theme,
};

pub mod binding;
pub mod entities;
pub mod formatting;
pub mod presentation;
pub mod theme;
mod views;

#[derive(Clone)]
pub struct BackendBridge {
    pub to_backend: mpsc::Sender<SessionRequest>,
    /// Capacity of each player's host/controller channels.
    pub channel_buffer: usize,
}

impl BackendBridge {
    /// Starts a bridge session for a newly visible player.
    pub fn open_player(&self, initial: Option<ContentId>) -> anyhow::Result<PlayerBinding> {
        PlayerBinding::mount(&self.to_backend, initial, self.channel_buffer)
    }
}

impl Global for BackendBridge {}

/// Opens the player window: one card per theme, all following the album
/// picked from `catalog`.
pub fn run(
    bridge: BackendBridge,
    catalog: StaticCatalog,
    themes: Vec<Theme>,
) -> anyhow::Result<()> {
    let app = Application::new().with_assets(gpui_component_assets::Assets);
    let catalog: Vec<CatalogItem> = catalog.items().cloned().collect();
    let initial = catalog.first().map(CatalogItem::content_id);

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.set_global(bridge.clone());

        let mut players = Vec::with_capacity(themes.len());
        for theme in themes {
            match bridge.open_player(initial.clone()) {
                Ok(binding) => players.push(cx.new(|cx| PlayerEntity::new(binding, theme, cx))),
                Err(e) => log::error!("Could not open the {} player: {e:#}", theme.name),
            }
        }
        let data = DataEntities { catalog, players };

        cx.spawn(async move |cx| {
            cx.open_window(WindowOptions::default(), |window, cx| {
                let view = cx.new(|cx| crate::views::FrontendUi::new(&data, window, cx));
                cx.new(|cx| Root::new(view, window, cx))
            })?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });

    Ok(())
}
