//! Content metadata rows: just enough of a content object for the tree and
//! alias layers to hang names, sections, and the always-available flag on.

use super::*;

const CONTENT_COLUMNS: &str = "id, name, section_id, owner_id, current_version, \
                               always_available, main_node_id, published_at, modified_at, status";

fn decode_content(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentInfo> {
    let status_raw: i64 = row.get(9)?;
    Ok(ContentInfo {
        id: row.get(0)?,
        name: row.get(1)?,
        section_id: row.get(2)?,
        owner_id: row.get(3)?,
        current_version: row.get(4)?,
        always_available: row.get::<_, i64>(5)? != 0,
        main_node_id: row.get(6)?,
        published_at: row.get(7)?,
        modified_at: row.get(8)?,
        status: ContentStatus::from_repr(status_raw).unwrap_or(ContentStatus::Draft),
    })
}

pub(super) fn load_content_row(conn: &Connection, content_id: i64) -> Result<Option<ContentInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTENT_COLUMNS} FROM contentobject WHERE id = ?1"
    ))?;
    let row = stmt
        .query_row(params![content_id], decode_content)
        .optional()?;
    Ok(row)
}

/// Duplicates a content row with fresh timestamps. The copy starts without a
/// main location; the caller assigns one once its locations exist.
pub(super) fn copy_content_row(
    conn: &Connection,
    content_id: i64,
    section_id: i64,
    new_owner: Option<i64>,
) -> Result<i64> {
    let now = timestamp_secs();
    let changed = conn.execute(
        "INSERT INTO contentobject (name, section_id, owner_id, current_version, \
         always_available, main_node_id, published_at, modified_at, status) \
         SELECT name, CASE WHEN ?2 != 0 THEN ?2 ELSE section_id END, \
                COALESCE(?4, owner_id), \
                current_version, always_available, 0, ?3, ?3, status \
         FROM contentobject WHERE id = ?1",
        params![content_id, section_id, now, new_owner],
    )?;
    if changed == 0 {
        return Err(StorageError::ContentNotFound(content_id).into());
    }
    Ok(conn.last_insert_rowid())
}

impl Repository {
    /// Creates a published content object. Drafts have no URLs, so the engine
    /// only ever sees content from its publish onward.
    pub fn create_content(&self, name: &str, always_available: bool) -> Result<ContentInfo> {
        self.with_immediate_tx(|tx| {
            let now = timestamp_secs();
            tx.execute(
                "INSERT INTO contentobject (name, always_available, published_at, modified_at, \
                 status) VALUES (?1, ?2, ?3, ?3, ?4)",
                params![
                    name,
                    always_available as i64,
                    now,
                    ContentStatus::Published as i64
                ],
            )?;
            let id = tx.last_insert_rowid();
            load_content_row(tx, id)?.ok_or_else(|| StorageError::ContentNotFound(id).into())
        })
    }

    pub fn load_content_info(&self, content_id: i64) -> Result<ContentInfo> {
        let conn = self.connection()?;
        load_content_row(&conn, content_id)?
            .ok_or_else(|| StorageError::ContentNotFound(content_id).into())
    }

    /// Renames a content object. The URL entries are not touched here;
    /// republish the aliases to make the new name addressable.
    pub fn set_content_name(&self, content_id: i64, name: &str) -> Result<ContentInfo> {
        self.with_immediate_tx(|tx| {
            let changed = tx.execute(
                "UPDATE contentobject SET name = ?1, modified_at = ?2 WHERE id = ?3",
                params![name, timestamp_secs(), content_id],
            )?;
            if changed == 0 {
                return Err(StorageError::ContentNotFound(content_id).into());
            }
            load_content_row(tx, content_id)?
                .ok_or_else(|| StorageError::ContentNotFound(content_id).into())
        })
    }

    /// Flips the always-available flag and mirrors it onto bit 0 of every
    /// active URL entry of the object's locations.
    pub fn set_always_available(&self, content_id: i64, always_available: bool) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let changed = tx.execute(
                "UPDATE contentobject SET always_available = ?1, modified_at = ?2 WHERE id = ?3",
                params![always_available as i64, timestamp_secs(), content_id],
            )?;
            if changed == 0 {
                return Err(StorageError::ContentNotFound(content_id).into());
            }
            let mut stmt =
                tx.prepare("SELECT node_id FROM location WHERE contentobject_id = ?1")?;
            let nodes = stmt
                .query_map(params![content_id], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for node in nodes {
                let action = Action::Node(node).encode();
                if always_available {
                    tx.execute(
                        "UPDATE url_alias SET lang_mask = lang_mask | 1 \
                         WHERE action = ?1 AND is_original = 1",
                        params![action],
                    )?;
                } else {
                    tx.execute(
                        "UPDATE url_alias SET lang_mask = lang_mask & ~1 \
                         WHERE action = ?1 AND is_original = 1",
                        params![action],
                    )?;
                }
            }
            Ok(())
        })
    }
}
