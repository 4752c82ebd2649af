//! The flat alias table gateway: row access and historization primitives.
//!
//! Logical identity of a row is `(parent, text_md5)`. The surrogate
//! `id`/`link` pair exists so a rename can retire a row in O(1): the row gets
//! a fresh id, its `link` forwards old readers to the new original, and the
//! children that referenced the old id are re-pointed in one bulk update.

use super::*;

mod custom;
mod lookup;
mod publish;

pub(super) use lookup::load_path_to_root;
pub(super) use publish::{
    alias_parent_for_node, location_copied_tx, location_deleted_tx, location_moved_tx,
    location_swapped_tx, publish_slot,
};

const ALIAS_COLUMNS: &str = "id, link, parent, text, text_md5, action, action_type, lang_mask, \
                             is_alias, is_original, alias_redirects";

pub(super) fn decode_alias_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AliasRow> {
    let action_raw: String = row.get(5)?;
    let action = Action::decode(&action_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown alias action '{action_raw}'").into(),
        )
    })?;
    Ok(AliasRow {
        id: AliasId(row.get(0)?),
        link: AliasId(row.get(1)?),
        parent: AliasId(row.get(2)?),
        text: row.get(3)?,
        text_md5: row.get(4)?,
        action,
        lang_mask: LanguageMask::from_raw(row.get::<_, i64>(7)? as u64),
        is_alias: row.get::<_, i64>(8)? != 0,
        is_original: row.get::<_, i64>(9)? != 0,
        alias_redirects: row.get::<_, i64>(10)? != 0,
    })
}

/// Allocates the next row id from the dedicated counter. Never the table's
/// own rowid: historization reassigns ids as plain data updates.
pub(super) fn next_alias_id(conn: &Connection) -> Result<AliasId> {
    let value: i64 = conn
        .query_row(
            "UPDATE url_alias_seq SET value = value + 1 RETURNING value",
            [],
            |row| row.get(0),
        )
        .context("failed to advance url alias id counter")?;
    Ok(AliasId(value))
}

pub(super) fn insert_alias_row(conn: &Connection, new: NewAliasRow) -> Result<AliasRow> {
    let id = next_alias_id(conn)?;
    let row = new.into_row(id);
    conn.execute(
        "INSERT INTO url_alias (id, link, parent, text, text_md5, action, action_type, \
         lang_mask, is_alias, is_original, alias_redirects) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.id.raw(),
            row.link.raw(),
            row.parent.raw(),
            row.text,
            row.text_md5,
            row.action.encode(),
            row.action.kind().as_ref(),
            row.lang_mask.raw() as i64,
            row.is_alias as i64,
            row.is_original as i64,
            row.alias_redirects as i64,
        ],
    )?;
    Ok(row)
}

pub(super) fn load_rows_at(
    conn: &Connection,
    parent: AliasId,
    text_md5: &str,
) -> Result<Vec<AliasRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALIAS_COLUMNS} FROM url_alias \
         WHERE parent = ?1 AND text_md5 = ?2 ORDER BY is_original DESC, id"
    ))?;
    let rows = stmt
        .query_map(params![parent.raw(), text_md5], decode_alias_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(super) fn load_rows_by_id(conn: &Connection, id: AliasId) -> Result<Vec<AliasRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALIAS_COLUMNS} FROM url_alias WHERE id = ?1 ORDER BY is_original DESC"
    ))?;
    let rows = stmt
        .query_map(params![id.raw()], decode_alias_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// The active autogenerated row at a trie slot, if any.
pub(super) fn load_autogenerated_at(
    conn: &Connection,
    parent: AliasId,
    text_md5: &str,
) -> Result<Option<AliasRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALIAS_COLUMNS} FROM url_alias \
         WHERE parent = ?1 AND text_md5 = ?2 AND is_original = 1 AND is_alias = 0 \
         ORDER BY id LIMIT 1"
    ))?;
    let row = stmt
        .query_row(params![parent.raw(), text_md5], decode_alias_row)
        .optional()?;
    Ok(row)
}

pub(super) fn load_rows_for_action(
    conn: &Connection,
    action: &Action,
    only_original: bool,
) -> Result<Vec<AliasRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALIAS_COLUMNS} FROM url_alias \
         WHERE action = ?1 AND (?2 = 0 OR is_original = 1) ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![action.encode(), only_original as i64], decode_alias_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// The core soft-rename primitive: flips `is_original`, forwards `link` to
/// the superseding row, and reassigns the row id so the old value is free to
/// serve as a pure history handle. Idempotent: a vanished original is a no-op.
/// Returns the retired row's old id.
pub(super) fn historize(
    conn: &Connection,
    parent: AliasId,
    text_md5: &str,
    new_link: AliasId,
) -> Result<Option<AliasId>> {
    let Some(row) = load_autogenerated_at(conn, parent, text_md5)? else {
        return Ok(None);
    };
    let fresh = next_alias_id(conn)?;
    conn.execute(
        "UPDATE url_alias SET id = ?1, link = ?2, is_original = 0 \
         WHERE parent = ?3 AND text_md5 = ?4 AND id = ?5",
        params![fresh.raw(), new_link.raw(), parent.raw(), text_md5, row.id.raw()],
    )?;
    Ok(Some(row.id))
}

/// Re-points all rows currently linking to `old_id` at `new_id`. History
/// chains stay one hop long because this runs eagerly on every supersession.
pub(super) fn historize_id(conn: &Connection, old_id: AliasId, new_id: AliasId) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE url_alias SET link = ?2 WHERE link = ?1 AND is_original = 0",
        params![old_id.raw(), new_id.raw()],
    )?;
    Ok(changed)
}

/// Moves all children of a retired row under its successor.
pub(super) fn reparent(conn: &Connection, old_parent: AliasId, new_parent: AliasId) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE url_alias SET parent = ?2 WHERE parent = ?1",
        params![old_parent.raw(), new_parent.raw()],
    )?;
    Ok(changed)
}

/// Retires one autogenerated row in favor of `new_id`: historize, move its
/// children, converge older history rows. The three updates always run inside
/// the caller's transaction.
pub(super) fn retire_row(
    conn: &Connection,
    parent: AliasId,
    text_md5: &str,
    new_id: AliasId,
) -> Result<Option<AliasId>> {
    let Some(old_id) = historize(conn, parent, text_md5, new_id)? else {
        return Ok(None);
    };
    reparent(conn, old_id, new_id)?;
    historize_id(conn, old_id, new_id)?;
    Ok(Some(old_id))
}

/// Clears one language bit from the active row at a slot. Used when the row
/// still serves other languages.
pub(super) fn remove_translation(
    conn: &Connection,
    parent: AliasId,
    text_md5: &str,
    language: LanguageId,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE url_alias SET lang_mask = lang_mask & ?3 \
         WHERE parent = ?1 AND text_md5 = ?2 AND is_original = 1",
        params![parent.raw(), text_md5, !(language.raw()) as i64],
    )?;
    Ok(changed)
}

/// The archive-vs-remove decision: a row that still serves another language
/// only loses the withdrawn bit; a row that serves none is retired as
/// history. Never deletes a row that another language depends on.
pub(super) fn archive_for_deleted_translation(
    conn: &Connection,
    row: &AliasRow,
    language: LanguageId,
    new_link: AliasId,
) -> Result<()> {
    if row.lang_mask.serves_other_languages(language) {
        remove_translation(conn, row.parent, &row.text_md5, language)?;
    } else {
        retire_row(conn, row.parent, &row.text_md5, new_link)?;
    }
    Ok(())
}

/// After a publish at `(parent, text_md5)` with id `new_id`, finds the other
/// autogenerated original row for the same action and language and archives
/// it. Guarantees republishing retires exactly the stale entry.
pub(super) fn cleanup_after_publish(
    conn: &Connection,
    action: &Action,
    language: LanguageId,
    new_id: AliasId,
    parent: AliasId,
    text_md5: &str,
) -> Result<()> {
    let stale: Vec<AliasRow> = load_rows_for_action(conn, action, true)?
        .into_iter()
        .filter(|row| {
            !row.is_alias
                && row.lang_mask.contains(language)
                && !(row.parent == parent && row.text_md5 == text_md5)
        })
        .collect();
    for row in stale {
        debug!(
            action = %action,
            parent = row.parent.raw(),
            text = %row.text,
            "archiving stale alias after publish"
        );
        archive_for_deleted_translation(conn, &row, language, new_id)?;
    }
    Ok(())
}

/// Bulk-historizes all original autogenerated rows of an action that overlap
/// the given mask (the always-available bit is ignored for matching). Links
/// and children are left untouched; the swap republish follows immediately
/// and re-points both at the fresh entries.
pub(super) fn historize_before_swap(
    conn: &Connection,
    action: &Action,
    mask: LanguageMask,
) -> Result<Vec<AliasRow>> {
    let rows: Vec<AliasRow> = load_rows_for_action(conn, action, true)?
        .into_iter()
        .filter(|row| !row.is_alias && row.lang_mask.intersects(mask))
        .collect();
    for row in &rows {
        let fresh = next_alias_id(conn)?;
        conn.execute(
            "UPDATE url_alias SET id = ?1, is_original = 0 \
             WHERE parent = ?2 AND text_md5 = ?3 AND id = ?4",
            params![fresh.raw(), row.parent.raw(), row.text_md5, row.id.raw()],
        )?;
    }
    Ok(rows)
}

impl Repository {
    /// Inserts one raw alias row with the standard defaults applied.
    pub fn insert_alias(&self, new: NewAliasRow) -> Result<AliasRow> {
        self.with_immediate_tx(|tx| insert_alias_row(tx, new))
    }

    /// All rows at a trie slot, active first.
    pub fn load_alias_rows(&self, parent: AliasId, text: &str) -> Result<Vec<AliasRow>> {
        let conn = self.connection()?;
        load_rows_at(&conn, parent, &text_md5(text))
    }

    /// Withdraws one translation of a location's aliases. Rows serving other
    /// languages keep the remaining bits; rows serving none become history
    /// pointing at a surviving sibling translation, or are dropped when the
    /// action has no other active row left.
    pub fn archive_url_aliases_for_deleted_translations(
        &self,
        node_id: i64,
        language_codes: &[String],
    ) -> Result<()> {
        let languages = self.language_ids(language_codes)?;
        self.with_immediate_tx(|tx| {
            let action = Action::Node(node_id);
            for language in languages {
                let rows: Vec<AliasRow> = load_rows_for_action(tx, &action, true)?
                    .into_iter()
                    .filter(|row| !row.is_alias && row.lang_mask.contains(language))
                    .collect();
                for row in rows {
                    let survivor = load_rows_for_action(tx, &action, true)?
                        .into_iter()
                        .find(|other| {
                            !other.is_alias
                                && other.id != row.id
                                && other.lang_mask.serves_other_languages(language)
                        });
                    match survivor {
                        Some(other) => {
                            archive_for_deleted_translation(tx, &row, language, other.id)?;
                        }
                        None if row.lang_mask.serves_other_languages(language) => {
                            remove_translation(tx, row.parent, &row.text_md5, language)?;
                        }
                        None => {
                            // Last translation of the last row: nothing left
                            // to forward to, so the entry is dropped.
                            tx.execute(
                                "DELETE FROM url_alias \
                                 WHERE parent = ?1 AND text_md5 = ?2 AND id = ?3",
                                params![row.parent.raw(), row.text_md5, row.id.raw()],
                            )?;
                        }
                    }
                }
            }
            Ok(())
        })
    }
}
