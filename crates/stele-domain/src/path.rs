//! Tree path strings and URL segment normalization.

use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Errors for malformed path strings. Rejected at construction, never
/// persisted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("[ST530] invalid path string '{0}': must match /(\\d+/)+")]
    InvalidPathString(String),
    #[error("[ST531] path string '{0}' does not end in node {1}")]
    TailMismatch(String, i64),
}

/// Slash-delimited chain of ancestor node ids, e.g. `/1/2/314/`.
///
/// Always starts and ends with `/`; the last segment is the owning node's id;
/// depth equals the segment count.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathString(String);

impl PathString {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let inner = raw
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .ok_or_else(|| PathError::InvalidPathString(raw.to_string()))?;
        if inner.is_empty()
            || !inner
                .split('/')
                .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(PathError::InvalidPathString(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The path of a root node: `/<id>/`.
    pub fn root(node_id: i64) -> Self {
        Self(format!("/{node_id}/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| seg.parse().unwrap_or(0))
            .collect()
    }

    pub fn depth(&self) -> i64 {
        self.0.matches('/').count() as i64 - 1
    }

    pub fn last_id(&self) -> i64 {
        self.ids().last().copied().unwrap_or(0)
    }

    /// Appends a child id, producing the child's path string.
    pub fn child(&self, node_id: i64) -> Self {
        Self(format!("{}{node_id}/", self.0))
    }

    /// The ancestor chain excluding the node itself, root first.
    pub fn ancestors(&self) -> Vec<i64> {
        let mut ids = self.ids();
        ids.pop();
        ids
    }

    pub fn is_descendant_of(&self, other: &PathString) -> bool {
        self.0 != other.0 && self.0.starts_with(&other.0)
    }

    /// Prefix substitution used by subtree moves: rewrites `old_prefix` to
    /// `new_prefix`. Returns `None` when this path is outside the subtree.
    pub fn rebase(&self, old_prefix: &PathString, new_prefix: &PathString) -> Option<Self> {
        self.0
            .strip_prefix(&old_prefix.0)
            .map(|tail| Self(format!("{}{tail}", new_prefix.0)))
    }

    /// Checks the tail-segment invariant against the owning node.
    pub fn verify_tail(&self, node_id: i64) -> Result<(), PathError> {
        if self.last_id() == node_id {
            Ok(())
        } else {
            Err(PathError::TailMismatch(self.0.clone(), node_id))
        }
    }
}

impl fmt::Display for PathString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PathString {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathString> for String {
    fn from(value: PathString) -> Self {
        value.0
    }
}

/// Normalizes a name into a URL path segment: ASCII-folds the Latin-1 range,
/// lowercases, and collapses anything else into single dashes.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        let folded = fold_char(ch);
        if folded.is_empty() {
            if !out.is_empty() {
                pending_dash = true;
            }
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.push_str(&folded);
    }
    if out.is_empty() {
        // Nameless content still needs an addressable segment.
        "1".to_string()
    } else {
        out
    }
}

fn fold_char(ch: char) -> String {
    match ch {
        'a'..='z' | '0'..='9' => ch.to_string(),
        'A'..='Z' => ch.to_ascii_lowercase().to_string(),
        'à'..='å' | 'À'..='Å' => "a".to_string(),
        'è'..='ë' | 'È'..='Ë' => "e".to_string(),
        'ì'..='ï' | 'Ì'..='Ï' => "i".to_string(),
        'ò'..='ö' | 'Ò'..='Ö' => "o".to_string(),
        'ù'..='ü' | 'Ù'..='Ü' => "u".to_string(),
        'ç' | 'Ç' => "c".to_string(),
        'ñ' | 'Ñ' => "n".to_string(),
        'ß' => "ss".to_string(),
        'æ' | 'Æ' => "ae".to_string(),
        'ø' | 'Ø' => "o".to_string(),
        _ if ch.is_alphanumeric() => ch.to_lowercase().to_string(),
        _ => String::new(),
    }
}

/// Lookup hash of a path segment. Hashing is case-insensitive so that
/// `Foo` and `foo` occupy the same trie slot.
pub fn text_md5(text: &str) -> String {
    hex::encode(Md5::digest(text.to_lowercase().as_bytes()))
}
