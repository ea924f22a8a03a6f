//! Images and attachments of a product, where a non-empty set always has
//! exactly one primary item.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Attachment,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Attachment => "attachment",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "attachment" => Ok(MediaKind::Attachment),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaItem {
    pub id: i64,
    pub is_primary: bool,
}

/// Primary flag change to persist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryChange {
    pub id: i64,
    pub is_primary: bool,
}

/// One product's media of a single kind, oldest first
#[derive(Debug, Clone, Default)]
pub struct ProductMediaSet {
    items: Vec<MediaItem>,
}

impl ProductMediaSet {
    pub fn new(mut items: Vec<MediaItem>) -> Self {
        items.sort_by_key(|item| item.id);
        Self { items }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn primary(&self) -> Option<i64> {
        self.items.iter().find(|i| i.is_primary).map(|i| i.id)
    }

    /// Make `id` the only primary item
    pub fn promote(&mut self, id: i64) -> Vec<PrimaryChange> {
        let mut changes = Vec::new();
        for item in &mut self.items {
            let should_be_primary = item.id == id;
            if item.is_primary != should_be_primary {
                item.is_primary = should_be_primary;
                changes.push(PrimaryChange {
                    id: item.id,
                    is_primary: should_be_primary,
                });
            }
        }
        changes
    }

    /// Restore the invariant after an insert or delete.
    ///
    /// With several primaries the newest one wins, since it was flagged last.
    /// With none, the oldest item becomes primary.
    pub fn ensure_exactly_one_primary(&mut self) -> Vec<PrimaryChange> {
        let keep = self
            .items
            .iter()
            .rev()
            .find(|i| i.is_primary)
            .or_else(|| self.items.first())
            .map(|i| i.id);
        match keep {
            Some(id) => self.promote(id),
            None => Vec::new(),
        }
    }
}
