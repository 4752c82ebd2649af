//! Typed rows of the flat URL-alias index.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::LanguageMask;
use crate::path::text_md5;

/// Parent key of top-level aliases. Not a row id; nothing is stored under it.
pub const ROOT_PARENT: AliasId = AliasId(0);

/// Opaque row identity handle, issued by the engine's monotonic counter.
///
/// Never a storage autoincrement: historization reassigns a row's id while
/// the old value lives on as other rows' `link`/`parent` target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AliasId(pub i64);

impl AliasId {
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AliasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What an alias row points at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Autogenerated or custom alias of a tree node: `eznode:<id>`.
    Node(i64),
    /// Virtual resource alias: `module:<path>`.
    Module(String),
    /// Placeholder branch point with no addressable endpoint: `nop:`.
    Nop,
}

/// The `action_type` column: the prefix of `action` before `:`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
pub enum ActionKind {
    #[strum(serialize = "eznode")]
    Node,
    #[strum(serialize = "module")]
    Module,
    #[strum(serialize = "nop")]
    Nop,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Node(_) => ActionKind::Node,
            Self::Module(_) => ActionKind::Module,
            Self::Nop => ActionKind::Nop,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Node(id) => format!("eznode:{id}"),
            Self::Module(path) => format!("module:{path}"),
            Self::Nop => "nop:".to_string(),
        }
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (kind, rest) = raw.split_once(':')?;
        match kind {
            "eznode" => rest.parse().ok().map(Self::Node),
            "module" => Some(Self::Module(rest.to_string())),
            "nop" => Some(Self::Nop),
            _ => None,
        }
    }

    pub fn node_id(&self) -> Option<i64> {
        match self {
            Self::Node(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// One row of the alias index. Logical identity is `(parent, text_md5)`;
/// `id`/`link` carry the history chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRow {
    pub id: AliasId,
    pub link: AliasId,
    pub parent: AliasId,
    pub text: String,
    pub text_md5: String,
    pub action: Action,
    pub lang_mask: LanguageMask,
    /// User-authored custom alias (true) vs autogenerated from a location
    /// name (false).
    pub is_alias: bool,
    /// Currently active entry (true) vs historized (false).
    pub is_original: bool,
    /// Whether traversal through this row should redirect to the canonical
    /// path instead of resolving in place.
    pub alias_redirects: bool,
}

impl AliasRow {
    pub fn is_history(&self) -> bool {
        !self.is_original
    }

    pub fn is_nop(&self) -> bool {
        matches!(self.action, Action::Nop)
    }
}

/// Insert-side column values with the original's defaulting rules applied by
/// [`NewAliasRow::into_row`].
#[derive(Clone, Debug)]
pub struct NewAliasRow {
    pub parent: AliasId,
    pub text: String,
    pub action: Action,
    pub lang_mask: LanguageMask,
    pub is_alias: bool,
    pub alias_redirects: bool,
    /// Pre-assigned link target; defaults to the fresh id.
    pub link: Option<AliasId>,
}

impl NewAliasRow {
    pub fn autogenerated(parent: AliasId, text: &str, node_id: i64, lang_mask: LanguageMask) -> Self {
        Self {
            parent,
            text: text.to_string(),
            action: Action::Node(node_id),
            lang_mask,
            is_alias: false,
            alias_redirects: true,
            link: None,
        }
    }

    pub fn custom(
        parent: AliasId,
        text: &str,
        action: Action,
        lang_mask: LanguageMask,
        forwarding: bool,
    ) -> Self {
        Self {
            parent,
            text: text.to_string(),
            action,
            lang_mask,
            is_alias: true,
            alias_redirects: forwarding,
            link: None,
        }
    }

    pub fn nop(parent: AliasId, text: &str) -> Self {
        Self {
            parent,
            text: text.to_string(),
            action: Action::Nop,
            lang_mask: LanguageMask::from_raw(crate::language::ALWAYS_AVAILABLE),
            is_alias: false,
            alias_redirects: false,
            link: None,
        }
    }

    /// Applies the defaulting rules: `link = id` unless pre-assigned,
    /// `is_original = (id == link)`, forced original for alias and NOP rows,
    /// `text_md5` derived from `text`.
    pub fn into_row(self, id: AliasId) -> AliasRow {
        let link = self.link.unwrap_or(id);
        let forced_original = self.is_alias || matches!(self.action, Action::Nop);
        AliasRow {
            id,
            link,
            parent: self.parent,
            text_md5: text_md5(&self.text),
            text: self.text,
            action: self.action,
            lang_mask: self.lang_mask,
            is_alias: self.is_alias,
            is_original: forced_original || id == link,
            alias_redirects: self.alias_redirects,
        }
    }
}
