//! URL-to-location resolution: iterative path-hash descent through the trie.

use super::*;

use super::alias::{load_path_to_root, load_rows_at};

/// Outcome of translating an inbound URL.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Resolved {
    /// The URL addresses a tree location.
    Location { node_id: i64 },
    /// The URL addresses a virtual resource (global alias).
    Resource { resource: String },
    /// The URL is historical or a forwarding alias; callers should redirect
    /// to the canonical path.
    Redirect { path: String },
}

impl Repository {
    /// Translates a URL into a location, resource, or redirect. Each segment
    /// is hashed and looked up under the accumulating parent chain; descent
    /// follows `link` so history entries lead to their successors. Language
    /// variants at a slot are disambiguated by the caller's priority list
    /// with always-available fallback — the same policy content loading uses.
    pub fn translate(&self, url: &str, language_codes: &[String]) -> Result<Resolved> {
        let priority = self.language_ids(language_codes)?;
        let segments: Vec<&str> = url
            .trim_matches('/')
            .split('/')
            .filter(|seg| !seg.is_empty())
            .collect();
        if segments.is_empty() {
            return Ok(Resolved::Location {
                node_id: ROOT_NODE_ID,
            });
        }

        let conn = self.connection()?;
        let mut parent = ROOT_PARENT;
        let mut traversed_history = false;
        let mut matched: Option<AliasRow> = None;
        for segment in &segments {
            let md5 = text_md5(segment);
            let mut rows = load_rows_at(&conn, parent, &md5)?;
            if rows.is_empty() {
                return Err(StorageError::UrlNotFound(url.to_string()).into());
            }
            let masks: Vec<LanguageMask> = rows.iter().map(|row| row.lang_mask).collect();
            let index = if priority.is_empty() {
                0
            } else {
                pick_best_translation(&priority, &masks)
                    .ok_or_else(|| StorageError::UrlNotFound(url.to_string()))?
            };
            let row = rows.swap_remove(index);
            traversed_history |= row.is_history();
            parent = row.link;
            matched = Some(row);
        }

        let Some(row) = matched else {
            return Err(StorageError::UrlNotFound(url.to_string()).into());
        };
        if row.is_nop() {
            // NOP nodes are branch points, never addressable endpoints.
            return Err(StorageError::UrlNotFound(url.to_string()).into());
        }
        if traversed_history {
            let canonical = match row.action {
                Action::Node(node_id) => self.load_autogenerated_path(node_id, language_codes)?,
                _ => load_path_to_root(&conn, row.link)?,
            };
            return Ok(Resolved::Redirect { path: canonical });
        }
        match row.action {
            Action::Node(node_id) if row.is_alias && row.alias_redirects => {
                let canonical = self.load_autogenerated_path(node_id, language_codes)?;
                Ok(Resolved::Redirect { path: canonical })
            }
            Action::Node(node_id) => Ok(Resolved::Location { node_id }),
            Action::Module(resource) => Ok(Resolved::Resource { resource }),
            Action::Nop => Err(StorageError::UrlNotFound(url.to_string()).into()),
        }
    }
}
