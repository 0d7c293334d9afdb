use gpui::Entity;
use tunebridge_bridge::catalog::CatalogItem;

pub mod player_entity;

#[derive(Debug, Clone)]
pub struct DataEntities {
    /// Albums the user can pick from.
    pub catalog: Vec<CatalogItem>,
    /// One entry per visible player, each with its own bridge session.
    pub players: Vec<Entity<player_entity::PlayerEntity>>,
}
