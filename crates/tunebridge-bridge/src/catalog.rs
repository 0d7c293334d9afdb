//! Catalog lookup as consumed by the bridge: given an album or track id,
//! obtain the identifier the embedded widget can play.

use std::collections::BTreeMap;

use crate::content::ContentId;

/// Kind of catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    Album,
    Track,
    Episode,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Track => "track",
            Self::Episode => "episode",
        }
    }
}

/// Displayable metadata for a catalog item.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub artist: String,
    /// Duration in milliseconds, when known.
    pub duration_ms: Option<u64>,
}

impl CatalogItem {
    /// Identifier to hand to the embedded widget.
    pub fn content_id(&self) -> ContentId {
        ContentId::from_parts(self.kind.as_str(), &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("no {kind} with id `{id}` in the catalog")]
    NotFound { kind: &'static str, id: String },
}

/// Source of catalog items. Remote search clients implement this; the bridge
/// only ever needs [`ContentResolver::resolve`].
pub trait ContentResolver {
    /// Returns the items matching `query` (title or artist, case-insensitive).
    fn search(&self, query: &str) -> Vec<CatalogItem>;

    /// Maps an item id to a playable identifier.
    fn resolve(&self, kind: ItemKind, id: &str) -> Result<ContentId, CatalogError>;
}

/// In-memory catalog backed by fixed data.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: BTreeMap<(ItemKind, String), CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| ((item.kind, item.id.clone()), item))
                .collect(),
        }
    }

    /// A handful of albums used by the demo binary.
    pub fn demo() -> Self {
        let album = |id: &str, title: &str, artist: &str| CatalogItem {
            id: id.to_string(),
            kind: ItemKind::Album,
            title: title.to_string(),
            artist: artist.to_string(),
            duration_ms: None,
        };
        Self::new([
            album("4aawyAB9vmqN3uQ7FjRGTy", "Global Warming", "Pitbull"),
            album("2noRn2Aes5aoNVsU6iWThc", "Discovery", "Daft Punk"),
            album("1ATL5GLyefJaxhQzSPVrLX", "Evermore", "Taylor Swift"),
            album("6dVIqQ8qmQ5GBnJ9shOYGE", "Thriller", "Michael Jackson"),
        ])
    }

    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }
}

impl ContentResolver for StaticCatalog {
    fn search(&self, query: &str) -> Vec<CatalogItem> {
        let query = query.trim().to_lowercase();
        self.items
            .values()
            .filter(|item| {
                query.is_empty()
                    || item.title.to_lowercase().contains(&query)
                    || item.artist.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    fn resolve(&self, kind: ItemKind, id: &str) -> Result<ContentId, CatalogError> {
        self.items
            .get(&(kind, id.to_string()))
            .map(CatalogItem::content_id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: kind.as_str(),
                id: id.to_string(),
            })
    }
}
