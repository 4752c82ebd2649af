//! Visibility: the hidden flag is user intent, invisibility is the computed
//! shadow it casts over the subtree.

use super::*;

impl Repository {
    /// Hides a location. The whole subtree becomes invisible, whatever the
    /// individual hidden flags below say.
    pub fn hide(&self, node_id: i64) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let location =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            tx.execute(
                "UPDATE location SET is_hidden = 1 WHERE node_id = ?1",
                params![node_id],
            )?;
            tx.execute(
                "UPDATE location SET is_invisible = 1 WHERE path_string LIKE ?1 || '%'",
                params![location.path_string.as_str()],
            )?;
            load_location_row(tx, node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(node_id).into())
        })
    }

    /// Clears the hidden flag. The subtree is revealed only when no ancestor
    /// is still hidden, and the reveal stops at descendants that are hidden
    /// in their own right.
    pub fn unhide(&self, node_id: i64) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let location =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            tx.execute(
                "UPDATE location SET is_hidden = 0 WHERE node_id = ?1",
                params![node_id],
            )?;
            let shadowed = location
                .path_string
                .ancestors()
                .into_iter()
                .try_fold(false, |acc, id| -> Result<bool> {
                    let hidden: Option<i64> = tx
                        .query_row(
                            "SELECT is_hidden FROM location WHERE node_id = ?1",
                            params![id],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(acc || hidden.unwrap_or(0) != 0)
                })?;
            if !shadowed {
                reveal_subtree(tx, node_id)?;
            }
            load_location_row(tx, node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(node_id).into())
        })
    }

    /// Sets or clears the computed shadow over a subtree without touching any
    /// hidden flag. Content-level hiding uses this to darken every location of
    /// an object at once.
    pub fn set_invisible(&self, node_id: i64, invisible: bool) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let location =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            tx.execute(
                "UPDATE location SET is_invisible = ?1 WHERE path_string LIKE ?2 || '%'",
                params![invisible as i64, location.path_string.as_str()],
            )?;
            load_location_row(tx, node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(node_id).into())
        })
    }
}

/// Iterative reveal: clears invisibility level by level, leaving subtrees
/// under still-hidden nodes untouched.
fn reveal_subtree(conn: &Connection, root: i64) -> Result<()> {
    conn.execute(
        "UPDATE location SET is_invisible = 0 WHERE node_id = ?1",
        params![root],
    )?;
    let mut frontier = vec![root];
    while let Some(node) = frontier.pop() {
        for child in load_children_rows(conn, node)? {
            if child.hidden {
                continue;
            }
            conn.execute(
                "UPDATE location SET is_invisible = 0 WHERE node_id = ?1",
                params![child.node_id],
            )?;
            frontier.push(child.node_id);
        }
    }
    Ok(())
}
