//! Location tree rows: load/create/update.

use super::*;

mod subtree;
mod visibility;

const LOCATION_COLUMNS: &str = "node_id, parent_node_id, path_string, is_hidden, is_invisible, \
                                priority, remote_id, contentobject_id, contentobject_version, \
                                depth, sort_field, sort_order, main_node_id";

pub(in crate::engine) fn decode_location(row: &rusqlite::Row<'_>) -> rusqlite::Result<Location> {
    let raw_path: String = row.get(2)?;
    let path_string = PathString::parse(&raw_path).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            err.to_string().into(),
        )
    })?;
    let sort_field_raw: i64 = row.get(10)?;
    let sort_order_raw: i64 = row.get(11)?;
    Ok(Location {
        node_id: row.get(0)?,
        parent_id: row.get(1)?,
        path_string,
        hidden: row.get::<_, i64>(3)? != 0,
        invisible: row.get::<_, i64>(4)? != 0,
        priority: row.get(5)?,
        remote_id: row.get(6)?,
        content_id: row.get(7)?,
        content_version: row.get(8)?,
        depth: row.get(9)?,
        sort_field: SortField::from_repr(sort_field_raw).unwrap_or(SortField::Path),
        sort_order: SortOrder::from_repr(sort_order_raw).unwrap_or(SortOrder::Ascending),
        main_node_id: row.get(12)?,
    })
}

pub(in crate::engine) fn load_location_row(
    conn: &Connection,
    node_id: i64,
) -> Result<Option<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM location WHERE node_id = ?1"
    ))?;
    let row = stmt
        .query_row(params![node_id], decode_location)
        .optional()?;
    Ok(row)
}

/// All rows of a subtree, parents before children.
pub(in crate::engine) fn load_subtree_rows(
    conn: &Connection,
    root: &Location,
) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM location \
         WHERE path_string LIKE ?1 || '%' ORDER BY path_string"
    ))?;
    let rows = stmt
        .query_map(params![root.path_string.as_str()], decode_location)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Repository {
    pub fn load_location(&self, node_id: i64) -> Result<Location> {
        let conn = self.connection()?;
        load_location_row(&conn, node_id)?.ok_or_else(|| StorageError::LocationNotFound(node_id).into())
    }

    pub fn load_location_by_remote_id(&self, remote_id: &str) -> Result<Location> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOCATION_COLUMNS} FROM location WHERE remote_id = ?1"
        ))?;
        stmt.query_row(params![remote_id], decode_location)
            .optional()?
            .ok_or_else(|| StorageError::RemoteIdNotFound(remote_id.to_string()).into())
    }

    /// Batch load preserving the requested order; unknown ids are skipped.
    pub fn load_location_list(&self, node_ids: &[i64]) -> Result<Vec<Location>> {
        let conn = self.connection()?;
        let mut out = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            if let Some(location) = load_location_row(&conn, *node_id)? {
                out.push(location);
            }
        }
        Ok(out)
    }

    pub fn load_children(&self, node_id: i64) -> Result<Vec<Location>> {
        let conn = self.connection()?;
        load_children_rows(&conn, node_id)
    }

    /// Inserts a location under an existing parent. Path string and depth are
    /// derived from the parent; visibility is inherited from it.
    pub fn create_location(&self, new: NewLocation) -> Result<Location> {
        self.with_immediate_tx(|tx| create_location_tx(tx, new))
    }

    /// Updates the mutable row attributes. `None` leaves a field unchanged.
    pub fn update_location(
        &self,
        node_id: i64,
        priority: Option<i64>,
        remote_id: Option<&str>,
        sort: Option<(SortField, SortOrder)>,
    ) -> Result<Location> {
        self.with_immediate_tx(|tx| {
            let current =
                load_location_row(tx, node_id)?.ok_or(StorageError::LocationNotFound(node_id))?;
            if let Some(remote_id) = remote_id {
                if remote_id != current.remote_id && remote_id_taken(tx, remote_id)? {
                    return Err(StorageError::RemoteIdConflict(remote_id.to_string()).into());
                }
            }
            let (sort_field, sort_order) = sort.unwrap_or((current.sort_field, current.sort_order));
            tx.execute(
                "UPDATE location SET priority = ?1, remote_id = ?2, sort_field = ?3, \
                 sort_order = ?4 WHERE node_id = ?5",
                params![
                    priority.unwrap_or(current.priority),
                    remote_id.unwrap_or(&current.remote_id),
                    sort_field as i64,
                    sort_order as i64,
                    node_id
                ],
            )?;
            load_location_row(tx, node_id)?
                .ok_or_else(|| StorageError::LocationNotFound(node_id).into())
        })
    }
}

pub(in crate::engine) fn load_children_rows(
    conn: &Connection,
    node_id: i64,
) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOCATION_COLUMNS} FROM location \
         WHERE parent_node_id = ?1 ORDER BY priority, node_id"
    ))?;
    let rows = stmt
        .query_map(params![node_id], decode_location)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(in crate::engine) fn remote_id_taken(conn: &Connection, remote_id: &str) -> Result<bool> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM location WHERE remote_id = ?1",
            params![remote_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

pub(in crate::engine) fn create_location_tx(
    conn: &Connection,
    new: NewLocation,
) -> Result<Location> {
    let parent = load_location_row(conn, new.parent_id)?
        .ok_or(StorageError::LocationNotFound(new.parent_id))?;
    if remote_id_taken(conn, &new.remote_id)? {
        return Err(StorageError::RemoteIdConflict(new.remote_id).into());
    }
    let invisible = new.hidden || parent.hidden || parent.invisible;
    conn.execute(
        "INSERT INTO location (parent_node_id, path_string, is_hidden, is_invisible, priority, \
         remote_id, contentobject_id, contentobject_version, depth, sort_field, sort_order, \
         main_node_id) VALUES (?1, '/0/', ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, 0)",
        params![
            new.parent_id,
            new.hidden as i64,
            invisible as i64,
            new.priority,
            new.remote_id,
            new.content_id,
            new.content_version,
            new.sort_field as i64,
            new.sort_order as i64,
        ],
    )?;
    let node_id = conn.last_insert_rowid();
    let path = parent.path_string.child(node_id);
    // Additional locations of an object inherit its established main node.
    let content_main: Option<i64> = conn
        .query_row(
            "SELECT main_node_id FROM contentobject WHERE id = ?1",
            params![new.content_id],
            |row| row.get(0),
        )
        .optional()?;
    let main_node_id = new
        .main_node_id
        .or(content_main.filter(|main| *main != 0))
        .unwrap_or(node_id);
    conn.execute(
        "UPDATE location SET path_string = ?1, depth = ?2, main_node_id = ?3 WHERE node_id = ?4",
        params![path.as_str(), path.depth(), main_node_id, node_id],
    )?;
    // First location of a content object becomes its main location.
    conn.execute(
        "UPDATE contentobject SET main_node_id = ?1 WHERE id = ?2 AND main_node_id = 0",
        params![node_id, new.content_id],
    )?;
    load_location_row(conn, node_id)?.ok_or_else(|| StorageError::LocationNotFound(node_id).into())
}
