//! Read-side alias lookups: path reconstruction and listing.

use super::*;

/// Walks parent pointers from an entry up to the root, rebuilding the path
/// top-down. A missing link is index corruption: the error names the portion
/// that could still be reconstructed so operators know where the chain broke.
/// A visited-set guards against cycles from corrupted data.
pub(in crate::engine) fn load_path_to_root(conn: &Connection, leaf: AliasId) -> Result<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = leaf;
    let mut visited: HashSet<i64> = HashSet::new();
    loop {
        if !visited.insert(current.raw()) {
            return Err(StorageError::IndexCorrupt(format!(
                "alias parent chain of entry {leaf} loops at entry {current}"
            ))
            .into());
        }
        let rows = load_rows_by_id(conn, current)?;
        let Some(row) = rows.first() else {
            return Err(StorageError::BrokenPath {
                id: leaf.raw(),
                last_good: segments.join("/"),
            }
            .into());
        };
        segments.insert(0, row.text.clone());
        if row.parent == ROOT_PARENT {
            return Ok(segments.join("/"));
        }
        current = row.parent;
    }
}

impl Repository {
    /// The canonical (autogenerated) URL of a location, with segment texts
    /// chosen by the caller's language priority.
    pub fn load_autogenerated_path(
        &self,
        node_id: i64,
        language_codes: &[String],
    ) -> Result<String> {
        let priority = self.language_ids(language_codes)?;
        let conn = self.connection()?;
        let location = crate::engine::location::load_location_row(&conn, node_id)?
            .ok_or(StorageError::LocationNotFound(node_id))?;
        let mut segments = Vec::new();
        for ancestor in location.path_string.ids() {
            if ancestor == ROOT_NODE_ID {
                continue;
            }
            let rows: Vec<AliasRow> = load_rows_for_action(&conn, &Action::Node(ancestor), true)?
                .into_iter()
                .filter(|row| !row.is_alias)
                .collect();
            if rows.is_empty() {
                return Err(StorageError::LocationAliasNotFound(ancestor).into());
            }
            let masks: Vec<LanguageMask> = rows.iter().map(|row| row.lang_mask).collect();
            let index = if priority.is_empty() {
                0
            } else {
                pick_best_translation(&priority, &masks).unwrap_or(0)
            };
            segments.push(rows[index].text.clone());
        }
        Ok(segments.join("/"))
    }

    /// Active alias entries of a location, optionally only the user-authored
    /// ones.
    pub fn list_url_aliases(&self, node_id: i64, custom_only: bool) -> Result<Vec<AliasRow>> {
        let conn = self.connection()?;
        let rows = load_rows_for_action(&conn, &Action::Node(node_id), true)?
            .into_iter()
            .filter(|row| !custom_only || row.is_alias)
            .collect();
        Ok(rows)
    }

    /// Loads one entry by id, preferring the active row when several share it.
    pub fn load_alias(&self, id: AliasId) -> Result<AliasRow> {
        let conn = self.connection()?;
        load_rows_by_id(&conn, id)?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::UrlNotFound(format!("alias entry {id}")).into())
    }

    /// The full URL of an alias entry (its text prefixed by its ancestors').
    pub fn load_alias_path(&self, id: AliasId) -> Result<String> {
        let conn = self.connection()?;
        load_path_to_root(&conn, id)
    }
}
