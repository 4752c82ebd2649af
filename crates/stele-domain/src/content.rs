//! Minimal content metadata the tree and alias layers need.

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::FromRepr, strum::AsRefStr,
)]
#[repr(i64)]
pub enum ContentStatus {
    Draft = 0,
    Published = 1,
    Archived = 2,
}

/// Content object metadata. The "main location" of a content object is
/// tracked here, not on the locations themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    pub id: i64,
    pub name: String,
    pub section_id: i64,
    pub owner_id: i64,
    pub current_version: i64,
    pub always_available: bool,
    /// Canonical location among possibly several. Zero until first publish.
    pub main_node_id: i64,
    pub published_at: i64,
    pub modified_at: i64,
    pub status: ContentStatus,
}

impl ContentInfo {
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}
