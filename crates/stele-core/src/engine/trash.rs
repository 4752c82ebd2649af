//! Trash: deleted subtrees staged for recovery. Trash rows mirror the
//! location rows they replace and remember the parent they hung from.

use super::*;

use crate::engine::alias::{alias_parent_for_node, location_deleted_tx, publish_slot};
use crate::engine::content::load_content_row;
use crate::engine::location::{load_location_row, load_subtree_rows, remote_id_taken};

const TRASH_COLUMNS: &str = "node_id, parent_node_id, path_string, is_hidden, is_invisible, \
                             priority, remote_id, contentobject_id, contentobject_version, \
                             depth, sort_field, sort_order, main_node_id, original_parent_id, \
                             trashed_at";

fn decode_trash_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrashedLocation> {
    let location = crate::engine::location::decode_location(row)?;
    Ok(TrashedLocation {
        location,
        original_parent_id: row.get(13)?,
        trashed_at: row.get(14)?,
    })
}

fn load_trash_row(conn: &Connection, node_id: i64) -> Result<Option<TrashedLocation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRASH_COLUMNS} FROM location_trash WHERE node_id = ?1"
    ))?;
    let row = stmt
        .query_row(params![node_id], decode_trash_row)
        .optional()?;
    Ok(row)
}

/// Drops a content row that no live location and no trash row references
/// anymore.
fn purge_orphaned_content(conn: &Connection, content_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM contentobject WHERE id = ?1 \
         AND NOT EXISTS (SELECT 1 FROM location WHERE contentobject_id = ?1) \
         AND NOT EXISTS (SELECT 1 FROM location_trash WHERE contentobject_id = ?1)",
        params![content_id],
    )?;
    Ok(())
}

impl Repository {
    /// Moves a subtree to the trash. All its URL entries are dropped (or
    /// downgraded to NOP branch points) exactly as on deletion; the location
    /// rows move to the trash table, children first.
    pub fn trash_subtree(&self, node_id: i64) -> Result<TrashedLocation> {
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
            let now = timestamp_secs();
            let rows = load_subtree_rows(tx, &source)?;
            for row in rows.iter().rev() {
                location_deleted_tx(tx, row.node_id)?;
                tx.execute(
                    "INSERT INTO location_trash (node_id, parent_node_id, path_string, \
                     is_hidden, is_invisible, priority, remote_id, contentobject_id, \
                     contentobject_version, depth, sort_field, sort_order, main_node_id, \
                     original_parent_id, trashed_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        row.node_id,
                        row.parent_id,
                        row.path_string.as_str(),
                        row.hidden as i64,
                        row.invisible as i64,
                        row.priority,
                        row.remote_id,
                        row.content_id,
                        row.content_version,
                        row.depth,
                        row.sort_field as i64,
                        row.sort_order as i64,
                        row.main_node_id,
                        row.parent_id,
                        now,
                    ],
                )?;
                tx.execute(
                    "DELETE FROM location WHERE node_id = ?1",
                    params![row.node_id],
                )?;
            }
            load_trash_row(tx, node_id)?
                .ok_or_else(|| StorageError::TrashItemNotFound(node_id).into())
        })
    }

    pub fn load_trash_item(&self, node_id: i64) -> Result<TrashedLocation> {
        let conn = self.connection()?;
        load_trash_row(&conn, node_id)?
            .ok_or_else(|| StorageError::TrashItemNotFound(node_id).into())
    }

    pub fn list_trash(&self) -> Result<Vec<TrashedLocation>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRASH_COLUMNS} FROM location_trash ORDER BY trashed_at, node_id"
        ))?;
        let rows = stmt
            .query_map([], decode_trash_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Restores one trash item as a fresh location. It returns to its
    /// original parent when that still exists; otherwise the caller must
    /// supply a destination. The content's name is republished as the new
    /// location's URL in the given language.
    pub fn recover_trash_item(
        &self,
        node_id: i64,
        new_parent_id: Option<i64>,
        language_code: &str,
    ) -> Result<Location> {
        let language = self.language_id(language_code)?;
        self.with_immediate_tx(|tx| {
            let item =
                load_trash_row(tx, node_id)?.ok_or(StorageError::TrashItemNotFound(node_id))?;
            let parent_id = match new_parent_id {
                Some(id) => {
                    load_location_row(tx, id)?.ok_or(StorageError::LocationNotFound(id))?;
                    id
                }
                None => {
                    if load_location_row(tx, item.original_parent_id)?.is_none() {
                        return Err(StorageError::MissingRecoveryParent(node_id).into());
                    }
                    item.original_parent_id
                }
            };
            if remote_id_taken(tx, &item.location.remote_id)? {
                return Err(StorageError::RemoteIdConflict(item.location.remote_id).into());
            }
            let restored = crate::engine::location::create_location_tx(
                tx,
                NewLocation {
                    parent_id,
                    content_id: item.location.content_id,
                    content_version: item.location.content_version,
                    remote_id: item.location.remote_id.clone(),
                    priority: item.location.priority,
                    hidden: item.location.hidden,
                    sort_field: item.location.sort_field,
                    sort_order: item.location.sort_order,
                    main_node_id: None,
                },
            )?;
            tx.execute(
                "DELETE FROM location_trash WHERE node_id = ?1",
                params![node_id],
            )?;
            tx.execute(
                "UPDATE contentobject SET main_node_id = ?1, status = ?2 \
                 WHERE id = ?3 AND main_node_id IN (0, ?4)",
                params![
                    restored.node_id,
                    ContentStatus::Published as i64,
                    restored.content_id,
                    node_id
                ],
            )?;
            // The object's other locations (and the restored row itself,
            // seeded from the stale pointer) still name the trashed node as
            // main.
            tx.execute(
                "UPDATE location SET main_node_id = ?1 \
                 WHERE contentobject_id = ?2 AND main_node_id IN (0, ?3)",
                params![restored.node_id, restored.content_id, node_id],
            )?;
            let content = load_content_row(tx, restored.content_id)?
                .ok_or(StorageError::ContentNotFound(restored.content_id))?;
            let parent_alias = alias_parent_for_node(tx, parent_id)?;
            let mask = LanguageMask::indicator(language, content.always_available);
            publish_slot(
                tx,
                parent_alias,
                &slug(&content.name),
                &Action::Node(restored.node_id),
                mask,
            )?;
            crate::engine::location::load_location_row(tx, restored.node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(restored.node_id).into())
        })
    }

    /// Permanently drops one trash item, purging its content if nothing else
    /// references it.
    pub fn remove_trash_item(&self, node_id: i64) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let item =
                load_trash_row(tx, node_id)?.ok_or(StorageError::TrashItemNotFound(node_id))?;
            tx.execute(
                "DELETE FROM location_trash WHERE node_id = ?1",
                params![node_id],
            )?;
            purge_orphaned_content(tx, item.location.content_id)?;
            Ok(())
        })
    }

    /// Empties the trash, purging all content that only the trash still held.
    pub fn empty_trash(&self) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let mut stmt = tx.prepare("SELECT node_id, contentobject_id FROM location_trash")?;
            let items = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let removed = items.len();
            tx.execute("DELETE FROM location_trash", [])?;
            for (_, content_id) in items {
                purge_orphaned_content(tx, content_id)?;
            }
            Ok(removed)
        })
    }
}
