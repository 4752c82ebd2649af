//! The storage engine: a SQLite-backed URL-alias index and location tree.
//!
//! One [`Repository`] owns a store file holding the flat alias table, the
//! location tree, the content metadata it references, the trash staging
//! area, and the language registry. All mutating sequences run inside a
//! single immediate transaction; see `connection.rs`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, warn};

use stele_domain::{
    pick_best_translation, slug, text_md5, Action, AliasId, AliasRow, ContentInfo,
    ContentStatus, LanguageError, LanguageId, LanguageMask, LanguageSet, Location, NewAliasRow,
    NewLocation, PathError, PathString, SortField, SortOrder, TrashedLocation, ROOT_PARENT,
};

mod alias;
mod connection;
mod content;
mod language;
mod location;
mod maintenance;
mod resolver;
mod schema;
mod trash;

pub use resolver::Resolved;

const STORE_FORMAT_VERSION: u32 = 1;
const SCHEMA_VERSION: u32 = 1;
const META_KEY_FORMAT_VERSION: &str = "store_format_version";
const META_KEY_SCHEMA_VERSION: &str = "schema_version";
const META_KEY_CREATED_BY: &str = "created_by_stele_version";
const META_KEY_LAST_USED: &str = "last_used_stele_version";
const STELE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The tree root. Created on store initialization; its children are the
/// top-level aliases (alias parent 0).
pub const ROOT_NODE_ID: i64 = 1;

/// Errors surfaced by the storage engine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("[ST500] location {0} does not exist")]
    LocationNotFound(i64),
    #[error("[ST500] no location with remote id '{0}'")]
    RemoteIdNotFound(String),
    #[error("[ST500] url '{0}' does not resolve")]
    UrlNotFound(String),
    #[error("[ST500] content {0} does not exist")]
    ContentNotFound(i64),
    #[error("[ST500] trash item {0} does not exist")]
    TrashItemNotFound(i64),
    #[error("[ST500] location {0} has no published url alias")]
    LocationAliasNotFound(i64),
    #[error("[ST501] url alias chain of entry {id} is broken; last good path is '{last_good}'")]
    BrokenPath { id: i64, last_good: String },
    #[error("[ST511] alias index is corrupt: {0}")]
    IndexCorrupt(String),
    #[error("[ST512] store metadata is missing required key '{0}'")]
    MissingMeta(String),
    #[error("[ST512] store format/schema incompatible for {key}: expected {expected}, found {found}")]
    IncompatibleFormat {
        key: String,
        expected: String,
        found: String,
    },
    #[error("[ST532] alias path '{0}' is not available: {1}")]
    InvalidAliasPath(String, String),
    // The moved node cannot be named `source`: thiserror reserves that
    // field name for the error-source chain.
    #[error("[ST540] cannot move {node} under {destination}")]
    InvalidMove { node: i64, destination: i64 },
    #[error("[ST540] trash item {0} has no surviving parent; a destination is required")]
    MissingRecoveryParent(i64),
    #[error("[ST541] remote id '{0}' is already in use")]
    RemoteIdConflict(String),
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Path(#[from] PathError),
}

impl StorageError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        use crate::diagnostics::store;
        match self {
            Self::LocationNotFound(_)
            | Self::RemoteIdNotFound(_)
            | Self::UrlNotFound(_)
            | Self::ContentNotFound(_)
            | Self::TrashItemNotFound(_)
            | Self::LocationAliasNotFound(_) => store::NOT_FOUND,
            Self::BrokenPath { .. } => store::BROKEN_PATH,
            Self::IndexCorrupt(_) => store::INDEX_CORRUPT,
            Self::MissingMeta(_) | Self::IncompatibleFormat { .. } => store::FORMAT_INCOMPATIBLE,
            Self::InvalidAliasPath(..) => store::INVALID_ALIAS_PATH,
            Self::InvalidMove { .. } | Self::MissingRecoveryParent(_) => store::INVALID_MOVE,
            Self::RemoteIdConflict(_) => store::REMOTE_ID_CONFLICT,
            Self::Language(_) => store::LANGUAGE,
            Self::Path(_) => store::INVALID_PATH,
        }
    }
}

/// Outcome of the repair passes run by `doctor`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DoctorSummary {
    pub aliases_without_location: usize,
    pub aliases_without_parent: usize,
    pub broken_links_removed: usize,
    pub nop_aliases_pruned: usize,
    pub links_repaired: usize,
    pub conflicting_rows_removed: usize,
}

impl DoctorSummary {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Assigns default object states to freshly copied content. The state
/// catalogue itself lives outside this engine.
pub trait ObjectStateHandler {
    fn assign_defaults(&self, content_id: i64) -> Result<()>;
}

/// No-op state assignment for callers without an object-state catalogue.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObjectStates;

impl ObjectStateHandler for NoopObjectStates {
    fn assign_defaults(&self, _content_id: i64) -> Result<()> {
        Ok(())
    }
}

/// Handle to one store file.
#[derive(Clone, Debug)]
pub struct Repository {
    db_path: PathBuf,
}

impl Repository {
    /// Opens (creating and initializing if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Self {
            db_path: path.as_ref().to_path_buf(),
        };
        repo.ensure_layout()?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

fn timestamp_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
