//! Location tree records.

use serde::{Deserialize, Serialize};

use crate::path::PathString;

/// Sibling ordering key.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::FromRepr, strum::AsRefStr,
)]
#[repr(i64)]
pub enum SortField {
    Path = 1,
    Published = 2,
    Modified = 3,
    Section = 4,
    Depth = 5,
    Priority = 6,
    Name = 7,
    NodeId = 8,
    ContentId = 9,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::FromRepr, strum::AsRefStr,
)]
#[repr(i64)]
pub enum SortOrder {
    Descending = 0,
    Ascending = 1,
}

/// A node in the content tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub node_id: i64,
    pub parent_id: i64,
    pub content_id: i64,
    pub content_version: i64,
    pub path_string: PathString,
    pub depth: i64,
    pub priority: i64,
    /// User intent: this node was explicitly hidden.
    pub hidden: bool,
    /// Computed: this node or an ancestor is hidden.
    pub invisible: bool,
    pub remote_id: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub main_node_id: i64,
}

impl Location {
    pub fn is_main(&self) -> bool {
        self.main_node_id == self.node_id
    }
}

/// Creation arguments; node id, path string, and depth are derived on insert.
#[derive(Clone, Debug)]
pub struct NewLocation {
    pub parent_id: i64,
    pub content_id: i64,
    pub content_version: i64,
    pub remote_id: String,
    pub priority: i64,
    pub hidden: bool,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    /// Pre-assigned main node; defaults to the new node itself.
    pub main_node_id: Option<i64>,
}

impl NewLocation {
    pub fn of_content(parent_id: i64, content_id: i64, remote_id: &str) -> Self {
        Self {
            parent_id,
            content_id,
            content_version: 1,
            remote_id: remote_id.to_string(),
            priority: 0,
            hidden: false,
            sort_field: SortField::Path,
            sort_order: SortOrder::Ascending,
            main_node_id: None,
        }
    }
}

/// A location staged in the trash, remembering where it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashedLocation {
    pub location: Location,
    /// Parent node id at the moment of deletion. May no longer exist.
    pub original_parent_id: i64,
    pub trashed_at: i64,
}
