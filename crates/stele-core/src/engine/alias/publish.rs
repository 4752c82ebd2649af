//! Autogenerated alias publishing and the location lifecycle hooks.

use super::*;

use crate::engine::location::load_location_row;

impl Repository {
    /// Publishes the autogenerated alias of a location for one language,
    /// retiring whatever entry the publish supersedes. This is the write-side
    /// entry point of every publish/rename event.
    pub fn publish_url_alias_for_location(
        &self,
        node_id: i64,
        name: &str,
        language_code: &str,
        always_available: bool,
    ) -> Result<AliasRow> {
        let language = self.language_id(language_code)?;
        self.with_immediate_tx(|tx| {
            let location = load_location_row(tx, node_id)?
                .ok_or(StorageError::LocationNotFound(node_id))?;
            let parent_alias = alias_parent_for_node(tx, location.parent_id)?;
            let mask = LanguageMask::indicator(language, always_available);
            publish_slot(
                tx,
                parent_alias,
                &slug(name),
                &Action::Node(node_id),
                mask,
            )
        })
    }

    /// Re-homes a moved location's aliases under the destination parent's
    /// alias. Old entries become history forwarding to the new ones; their
    /// children follow the new entry, so descendant aliases keep resolving.
    pub fn location_moved(&self, node_id: i64, new_parent_node: i64) -> Result<()> {
        self.with_immediate_tx(|tx| location_moved_tx(tx, node_id, new_parent_node))
    }

    /// Creates aliases for a copied location from the source's entries.
    pub fn location_copied(&self, source_node: i64, new_node: i64, new_parent_node: i64) -> Result<()> {
        self.with_immediate_tx(|tx| location_copied_tx(tx, source_node, new_node, new_parent_node))
    }

    /// Resets and recomputes both locations' aliases after their content
    /// association was exchanged: names follow content, tree slots do not.
    pub fn location_swapped(&self, node_a: i64, node_b: i64) -> Result<()> {
        self.with_immediate_tx(|tx| location_swapped_tx(tx, node_a, node_b))
    }

    /// Drops all alias entries of a deleted location. Entries that still
    /// anchor unrelated children are downgraded to NOP branch points instead
    /// of deleted; the NOP compaction pass collects them once childless.
    pub fn location_deleted(&self, node_id: i64) -> Result<()> {
        self.with_immediate_tx(|tx| location_deleted_tx(tx, node_id))
    }
}

pub(in crate::engine) fn location_moved_tx(
    tx: &rusqlite::Transaction<'_>,
    node_id: i64,
    new_parent_node: i64,
) -> Result<()> {
    let action = Action::Node(node_id);
    let rows: Vec<AliasRow> = load_rows_for_action(tx, &action, true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    if rows.is_empty() {
        return Ok(());
    }
    let new_parent_alias = alias_parent_for_node(tx, new_parent_node)?;
    for row in rows {
        if row.parent == new_parent_alias {
            continue;
        }
        publish_slot(tx, new_parent_alias, &row.text, &action, row.lang_mask)?;
    }
    Ok(())
}

pub(in crate::engine) fn location_copied_tx(
    tx: &rusqlite::Transaction<'_>,
    source_node: i64,
    new_node: i64,
    new_parent_node: i64,
) -> Result<()> {
    let source_rows: Vec<AliasRow> = load_rows_for_action(tx, &Action::Node(source_node), true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    if source_rows.is_empty() {
        return Ok(());
    }
    let new_parent_alias = alias_parent_for_node(tx, new_parent_node)?;
    for row in source_rows {
        publish_slot(
            tx,
            new_parent_alias,
            &row.text,
            &Action::Node(new_node),
            row.lang_mask,
        )?;
    }
    Ok(())
}

pub(in crate::engine) fn location_swapped_tx(
    tx: &rusqlite::Transaction<'_>,
    node_a: i64,
    node_b: i64,
) -> Result<()> {
    let action_a = Action::Node(node_a);
    let action_b = Action::Node(node_b);
    let rows_a: Vec<AliasRow> = load_rows_for_action(tx, &action_a, true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    let rows_b: Vec<AliasRow> = load_rows_for_action(tx, &action_b, true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    let mask_a = combined_mask(&rows_a);
    let mask_b = combined_mask(&rows_b);
    let retired_a = historize_before_swap(tx, &action_a, mask_a)?;
    let retired_b = historize_before_swap(tx, &action_b, mask_b)?;

    let location_a = load_location_row(tx, node_a)?.ok_or(StorageError::LocationNotFound(node_a))?;
    let location_b = load_location_row(tx, node_b)?.ok_or(StorageError::LocationNotFound(node_b))?;
    let parent_alias_a = alias_parent_for_node(tx, location_a.parent_id)?;
    let parent_alias_b = alias_parent_for_node(tx, location_b.parent_id)?;
    // Each node keeps its slot but takes the other's name entries.
    let mut published_a = Vec::with_capacity(rows_b.len());
    for row in &rows_b {
        published_a.push(publish_slot(tx, parent_alias_a, &row.text, &action_a, row.lang_mask)?);
    }
    let mut published_b = Vec::with_capacity(rows_a.len());
    for row in &rows_a {
        published_b.push(publish_slot(tx, parent_alias_b, &row.text, &action_b, row.lang_mask)?);
    }
    // The retired entries gave up their ids; their children and stale links
    // follow the node's republished entry.
    relink_after_swap(tx, &retired_a, &published_a)?;
    relink_after_swap(tx, &retired_b, &published_b)?;
    Ok(())
}

fn relink_after_swap(
    tx: &rusqlite::Transaction<'_>,
    retired: &[AliasRow],
    published: &[AliasRow],
) -> Result<()> {
    for row in retired {
        let target = published
            .iter()
            .find(|entry| entry.lang_mask.intersects(row.lang_mask))
            .or_else(|| published.first());
        if let Some(target) = target {
            reparent(tx, row.id, target.id)?;
            historize_id(tx, row.id, target.id)?;
        }
    }
    Ok(())
}

pub(in crate::engine) fn location_deleted_tx(
    tx: &rusqlite::Transaction<'_>,
    node_id: i64,
) -> Result<()> {
    let rows = load_rows_for_action(tx, &Action::Node(node_id), false)?;
    for row in rows {
        let child_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM url_alias WHERE parent = ?1",
            params![row.id.raw()],
            |r| r.get(0),
        )?;
        if child_count > 0 {
            tx.execute(
                "UPDATE url_alias SET action = 'nop:', action_type = 'nop', is_alias = 0, \
                 is_original = 1, lang_mask = 1, alias_redirects = 0, link = id \
                 WHERE parent = ?1 AND text_md5 = ?2 AND id = ?3",
                params![row.parent.raw(), row.text_md5, row.id.raw()],
            )?;
        } else {
            tx.execute(
                "DELETE FROM url_alias WHERE parent = ?1 AND text_md5 = ?2 AND id = ?3",
                params![row.parent.raw(), row.text_md5, row.id.raw()],
            )?;
        }
    }
    Ok(())
}

fn combined_mask(rows: &[AliasRow]) -> LanguageMask {
    rows.iter().fold(LanguageMask::default(), |acc, row| {
        LanguageMask::from_raw(acc.raw() | row.lang_mask.raw())
    })
}

/// The alias-table parent key for children of a location: 0 for the tree
/// root, otherwise the id of the location's active autogenerated entry.
pub(in crate::engine) fn alias_parent_for_node(
    conn: &Connection,
    parent_node_id: i64,
) -> Result<AliasId> {
    if parent_node_id == ROOT_NODE_ID || parent_node_id == 0 {
        return Ok(ROOT_PARENT);
    }
    let row = load_rows_for_action(conn, &Action::Node(parent_node_id), true)?
        .into_iter()
        .find(|row| !row.is_alias)
        .ok_or(StorageError::LocationAliasNotFound(parent_node_id))?;
    Ok(row.id)
}

/// Publishes one `(parent, text)` slot for an action and language mask,
/// applying the original's slot rules: merge into an entry for the same
/// action, take over a NOP placeholder, retire a conflicting autogenerated
/// entry, or step aside from a custom alias with a numeric suffix. Finishes
/// with the per-language cleanup of superseded entries elsewhere.
pub(in crate::engine) fn publish_slot(
    conn: &Connection,
    parent: AliasId,
    text: &str,
    action: &Action,
    mask: LanguageMask,
) -> Result<AliasRow> {
    let (text, md5) = unique_text(conn, parent, text, action)?;
    let existing = load_autogenerated_at(conn, parent, &md5)?;
    let published = match existing {
        Some(row) if row.action == *action => {
            let merged =
                LanguageMask::from_raw(row.lang_mask.language_bits() | mask.language_bits())
                    .with_always_available(mask.always_available());
            conn.execute(
                "UPDATE url_alias SET lang_mask = ?1, link = ?2, is_original = 1 \
                 WHERE parent = ?3 AND text_md5 = ?4 AND id = ?5",
                params![
                    merged.raw() as i64,
                    row.id.raw(),
                    parent.raw(),
                    md5,
                    row.id.raw()
                ],
            )?;
            AliasRow {
                lang_mask: merged,
                link: row.id,
                is_original: true,
                ..row
            }
        }
        Some(row) if row.is_nop() => {
            conn.execute(
                "UPDATE url_alias SET action = ?1, action_type = ?2, lang_mask = ?3, \
                 is_alias = 0, is_original = 1, alias_redirects = 1, link = id \
                 WHERE parent = ?4 AND text_md5 = ?5 AND id = ?6",
                params![
                    action.encode(),
                    action.kind().as_ref(),
                    mask.raw() as i64,
                    parent.raw(),
                    md5,
                    row.id.raw()
                ],
            )?;
            AliasRow {
                action: action.clone(),
                lang_mask: mask,
                is_alias: false,
                is_original: true,
                alias_redirects: true,
                link: row.id,
                ..row
            }
        }
        Some(row) => {
            // A different location held this name; it yields the slot and its
            // old URL forwards to the new occupant.
            let inserted = insert_alias_row(
                conn,
                NewAliasRow::autogenerated(parent, &text, unwrap_node(action), mask),
            )?;
            retire_specific(conn, &row, inserted.id)?;
            inserted
        }
        None => insert_alias_row(
            conn,
            NewAliasRow::autogenerated(parent, &text, unwrap_node(action), mask),
        )?,
    };
    for language in mask.languages() {
        cleanup_after_publish(conn, action, language, published.id, parent, &md5)?;
    }
    Ok(published)
}

fn unwrap_node(action: &Action) -> i64 {
    action.node_id().unwrap_or(0)
}

/// Retires one specific row in favor of `new_id` (the by-id variant of
/// `retire_row`, for when the slot holds a known conflicting entry).
fn retire_specific(conn: &Connection, row: &AliasRow, new_id: AliasId) -> Result<()> {
    let fresh = next_alias_id(conn)?;
    conn.execute(
        "UPDATE url_alias SET id = ?1, link = ?2, is_original = 0 \
         WHERE parent = ?3 AND text_md5 = ?4 AND id = ?5",
        params![
            fresh.raw(),
            new_id.raw(),
            row.parent.raw(),
            row.text_md5,
            row.id.raw()
        ],
    )?;
    reparent(conn, row.id, new_id)?;
    historize_id(conn, row.id, new_id)?;
    Ok(())
}

/// Finds the first text not blocked by a user-authored alias: `name`,
/// `name2`, `name3`, … Custom aliases always win the literal slot.
fn unique_text(
    conn: &Connection,
    parent: AliasId,
    base: &str,
    _action: &Action,
) -> Result<(String, String)> {
    let mut candidate = base.to_string();
    let mut suffix = 2u32;
    loop {
        let md5 = text_md5(&candidate);
        let blocked = load_rows_at(conn, parent, &md5)?
            .iter()
            .any(|row| row.is_original && row.is_alias);
        if !blocked {
            return Ok((candidate, md5));
        }
        candidate = format!("{base}{suffix}");
        suffix += 1;
    }
}
