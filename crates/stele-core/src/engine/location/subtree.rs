//! Subtree operations: move, copy, swap, delete, and the section and
//! main-location bookkeeping they drag along.

use super::*;

use crate::engine::alias::{
    alias_parent_for_node, location_copied_tx, location_deleted_tx, location_moved_tx,
    location_swapped_tx, publish_slot,
};
use crate::engine::content::{copy_content_row, load_content_row};

impl Repository {
    /// Moves a subtree under a new parent. Every descendant's path string and
    /// depth are rewritten, visibility is recomputed against the destination,
    /// and the old URLs become history forwarding to the new ones.
    pub fn move_subtree(&self, node_id: i64, new_parent_id: i64) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let source =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            let dest = load_location_row(tx, new_parent_id)?
                .ok_or(StorageError::LocationNotFound(new_parent_id))?;
            if node_id == ROOT_NODE_ID
                || dest.node_id == source.node_id
                || dest.path_string.is_descendant_of(&source.path_string)
            {
                return Err(StorageError::InvalidMove {
                    node: node_id,
                    destination: new_parent_id,
                }
                .into());
            }
            if dest.node_id == source.parent_id {
                return Ok(source);
            }

            let old_prefix = source.path_string.clone();
            let new_prefix = dest.path_string.child(node_id);
            let rows = load_subtree_rows(tx, &source)?;
            let mut invisible_by_node: HashMap<i64, bool> = HashMap::new();
            for row in &rows {
                let Some(path) = row.path_string.rebase(&old_prefix, &new_prefix) else {
                    continue;
                };
                let invisible = if row.node_id == node_id {
                    row.hidden || dest.hidden || dest.invisible
                } else {
                    row.hidden || invisible_by_node.get(&row.parent_id).copied().unwrap_or(false)
                };
                invisible_by_node.insert(row.node_id, invisible);
                tx.execute(
                    "UPDATE location SET path_string = ?1, depth = ?2, is_invisible = ?3 \
                     WHERE node_id = ?4",
                    params![path.as_str(), path.depth(), invisible as i64, row.node_id],
                )?;
            }
            tx.execute(
                "UPDATE location SET parent_node_id = ?1 WHERE node_id = ?2",
                params![new_parent_id, node_id],
            )?;

            // A moved main location drags its subtree's content into the
            // destination's section.
            if source.is_main() {
                if let Some(dest_content) = load_content_row(tx, dest.content_id)? {
                    if dest_content.section_id != 0 {
                        set_section_for_subtree_tx(tx, &new_prefix, dest_content.section_id)?;
                    }
                }
            }

            location_moved_tx(tx, node_id, new_parent_id)?;
            load_location_row(tx, node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(node_id).into())
        })
    }

    /// Copies a subtree under a new parent. Content objects are copied once
    /// per object even when several locations in the subtree share one, and
    /// the copy's main location follows the original's when that location is
    /// inside the copied subtree. Copies keep the source owner unless
    /// `new_owner` reassigns them.
    pub fn copy_subtree(
        &self,
        node_id: i64,
        new_parent_id: i64,
        new_owner: Option<i64>,
        states: &dyn ObjectStateHandler,
    ) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let source =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            let dest = load_location_row(tx, new_parent_id)?
                .ok_or(StorageError::LocationNotFound(new_parent_id))?;
            if dest.node_id == source.node_id
                || dest.path_string.is_descendant_of(&source.path_string)
            {
                return Err(StorageError::InvalidMove {
                    node: node_id,
                    destination: new_parent_id,
                }
                .into());
            }
            let dest_section = load_content_row(tx, dest.content_id)?
                .map(|content| content.section_id)
                .unwrap_or(0);

            let rows = load_subtree_rows(tx, &source)?;
            let mut content_map: HashMap<i64, i64> = HashMap::new();
            let mut location_map: HashMap<i64, i64> = HashMap::new();
            let mut invisible_by_node: HashMap<i64, bool> = HashMap::new();
            for row in &rows {
                let new_parent = if row.node_id == node_id {
                    dest.node_id
                } else {
                    // Parents precede children in path order.
                    *location_map
                        .get(&row.parent_id)
                        .ok_or(StorageError::LocationNotFound(row.parent_id))?
                };
                let new_content = match content_map.get(&row.content_id) {
                    Some(id) => *id,
                    None => {
                        let id = copy_content_row(tx, row.content_id, dest_section, new_owner)?;
                        states.assign_defaults(id)?;
                        content_map.insert(row.content_id, id);
                        id
                    }
                };
                let parent_invisible = if row.node_id == node_id {
                    dest.hidden || dest.invisible
                } else {
                    invisible_by_node.get(&new_parent).copied().unwrap_or(false)
                };
                let invisible = row.hidden || parent_invisible;

                let parent_path = if row.node_id == node_id {
                    dest.path_string.clone()
                } else {
                    load_location_row(tx, new_parent)?
                        .ok_or(StorageError::LocationNotFound(new_parent))?
                        .path_string
                };
                tx.execute(
                    "INSERT INTO location (parent_node_id, path_string, is_hidden, is_invisible, \
                     priority, remote_id, contentobject_id, contentobject_version, depth, \
                     sort_field, sort_order, main_node_id) \
                     VALUES (?1, '/0/', ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, 0)",
                    params![
                        new_parent,
                        row.hidden as i64,
                        invisible as i64,
                        row.priority,
                        format!("copying-{}-{}", row.node_id, new_parent),
                        new_content,
                        row.content_version,
                        row.sort_field as i64,
                        row.sort_order as i64,
                    ],
                )?;
                let new_node = tx.last_insert_rowid();
                let path = parent_path.child(new_node);
                tx.execute(
                    "UPDATE location SET path_string = ?1, depth = ?2, remote_id = ?3, \
                     main_node_id = ?4 WHERE node_id = ?5",
                    params![
                        path.as_str(),
                        path.depth(),
                        text_md5(&format!("{}{new_node}", row.remote_id)),
                        new_node,
                        new_node
                    ],
                )?;
                location_map.insert(row.node_id, new_node);
                invisible_by_node.insert(new_node, invisible);
                location_copied_tx(tx, row.node_id, new_node, new_parent)?;
            }

            // Main location of each copied object: the original main when it
            // was copied too, otherwise the first copied location.
            let mut main_by_content: HashMap<i64, i64> = HashMap::new();
            for row in &rows {
                let new_content = content_map[&row.content_id];
                let candidate = location_map[&row.node_id];
                let entry = main_by_content.entry(new_content).or_insert(candidate);
                if row.is_main() {
                    *entry = candidate;
                }
            }
            for (new_content, main_node) in &main_by_content {
                tx.execute(
                    "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2",
                    params![main_node, new_content],
                )?;
                tx.execute(
                    "UPDATE location SET main_node_id = ?1 WHERE contentobject_id = ?2",
                    params![main_node, new_content],
                )?;
            }

            let new_root = location_map[&node_id];
            load_location_row(tx, new_root)?
                .ok_or_else(|| StorageError::LocationNotFound(new_root).into())
        })
    }

    /// Exchanges the content association of two locations. Tree slots stay
    /// put; the URL entries follow the content, so each slot takes over the
    /// other's names.
    pub fn swap_locations(&self, node_a: i64, node_b: i64) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let a = load_location_row(tx, node_a)?.ok_or(StorageError::LocationNotFound(node_a))?;
            let b = load_location_row(tx, node_b)?.ok_or(StorageError::LocationNotFound(node_b))?;
            tx.execute(
                "UPDATE location SET contentobject_id = ?1, contentobject_version = ?2 \
                 WHERE node_id = ?3",
                params![b.content_id, b.content_version, node_a],
            )?;
            tx.execute(
                "UPDATE location SET contentobject_id = ?1, contentobject_version = ?2 \
                 WHERE node_id = ?3",
                params![a.content_id, a.content_version, node_b],
            )?;
            // Main pointers follow the content to its new slot.
            tx.execute(
                "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2 AND main_node_id = ?3",
                params![node_b, a.content_id, node_a],
            )?;
            tx.execute(
                "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2 AND main_node_id = ?3",
                params![node_a, b.content_id, node_b],
            )?;
            tx.execute(
                "UPDATE location SET main_node_id = ?1 \
                 WHERE contentobject_id = ?2 AND main_node_id = ?3",
                params![node_b, a.content_id, node_a],
            )?;
            tx.execute(
                "UPDATE location SET main_node_id = ?1 \
                 WHERE contentobject_id = ?2 AND main_node_id = ?3",
                params![node_a, b.content_id, node_b],
            )?;
            location_swapped_tx(tx, node_a, node_b)
        })
    }

    /// Deletes a subtree outright, children first. Content left without any
    /// location is dropped while still a draft, archived once published.
    pub fn remove_subtree(&self, node_id: i64) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let source =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            if node_id == ROOT_NODE_ID {
                return Err(StorageError::InvalidMove {
                    node: node_id,
                    destination: 0,
                }
                .into());
            }
            let rows = load_subtree_rows(tx, &source)?;
            for row in rows.iter().rev() {
                location_deleted_tx(tx, row.node_id)?;
                tx.execute(
                    "DELETE FROM location WHERE node_id = ?1",
                    params![row.node_id],
                )?;
                retire_orphaned_content(tx, row.content_id, row.node_id)?;
            }
            Ok(())
        })
    }

    /// Assigns a section to every content object whose main location lives in
    /// the subtree.
    pub fn set_section_for_subtree(&self, node_id: i64, section_id: i64) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let root =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            set_section_for_subtree_tx(tx, &root.path_string, section_id)
        })
    }

    /// Makes `node_id` the main location of its content object.
    pub fn change_main_location(&self, node_id: i64) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let location =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            tx.execute(
                "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2",
                params![node_id, location.content_id],
            )?;
            tx.execute(
                "UPDATE location SET main_node_id = ?1 WHERE contentobject_id = ?2",
                params![node_id, location.content_id],
            )?;
            Ok(())
        })
    }

    /// Re-creates the autogenerated alias of a location after a rename,
    /// without any tree change. The previous entry becomes history.
    pub fn republish_aliases_for_content(
        &self,
        content_id: i64,
        language_code: &str,
    ) -> Result<()> {
        let language = self.language_id(language_code)?;
        self.with_immediate_tx(|tx| {
            let content = load_content_row(tx, content_id)?
                .ok_or(StorageError::ContentNotFound(content_id))?;
            let mask = LanguageMask::indicator(language, content.always_available);
            let mut stmt =
                tx.prepare("SELECT node_id, parent_node_id FROM location WHERE contentobject_id = ?1")?;
            let nodes = stmt
                .query_map(params![content_id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (node, parent_node) in nodes {
                let parent_alias = alias_parent_for_node(tx, parent_node)?;
                publish_slot(
                    tx,
                    parent_alias,
                    &slug(&content.name),
                    &Action::Node(node),
                    mask,
                )?;
            }
            Ok(())
        })
    }
}

pub(in crate::engine) fn set_section_for_subtree_tx(
    conn: &Connection,
    prefix: &PathString,
    section_id: i64,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE contentobject SET section_id = ?1 WHERE main_node_id IN \
         (SELECT node_id FROM location WHERE path_string LIKE ?2 || '%')",
        params![section_id, prefix.as_str()],
    )?;
    Ok(changed)
}

/// Content that lost its last location is dropped as a draft, archived once
/// published. If the deleted node was the main location and others remain,
/// the lowest surviving node takes over.
pub(in crate::engine) fn retire_orphaned_content(
    conn: &Connection,
    content_id: i64,
    deleted_node: i64,
) -> Result<()> {
    let survivor: Option<i64> = conn
        .query_row(
            "SELECT MIN(node_id) FROM location WHERE contentobject_id = ?1",
            params![content_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    match survivor {
        Some(node) => {
            conn.execute(
                "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2 AND main_node_id = ?3",
                params![node, content_id, deleted_node],
            )?;
            conn.execute(
                "UPDATE location SET main_node_id = ?1 \
                 WHERE contentobject_id = ?2 AND main_node_id = ?3",
                params![node, content_id, deleted_node],
            )?;
        }
        None => {
            let status: Option<i64> = conn
                .query_row(
                    "SELECT status FROM contentobject WHERE id = ?1",
                    params![content_id],
                    |row| row.get(0),
                )
                .optional()?;
            match status.and_then(ContentStatus::from_repr) {
                Some(ContentStatus::Draft) => {
                    conn.execute(
                        "DELETE FROM contentobject WHERE id = ?1",
                        params![content_id],
                    )?;
                }
                Some(_) => {
                    conn.execute(
                        "UPDATE contentobject SET status = ?1, main_node_id = 0 WHERE id = ?2",
                        params![ContentStatus::Archived as i64, content_id],
                    )?;
                }
                None => {}
            }
        }
    }
    Ok(())
}
