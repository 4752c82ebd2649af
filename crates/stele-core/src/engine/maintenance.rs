//! Repair passes over the alias table. Each pass is safe to run on a healthy
//! store and reports how many rows it touched; `doctor` chains them all.

use super::*;

use crate::engine::alias::load_rows_for_action;
use crate::engine::connection::is_unique_violation;

impl Repository {
    /// Drops location-action entries whose location no longer exists.
    pub fn delete_url_aliases_without_location(&self) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let changed = tx.execute(
                "DELETE FROM url_alias WHERE action_type = 'eznode' \
                 AND CAST(substr(action, 8) AS INTEGER) NOT IN (SELECT node_id FROM location)",
                [],
            )?;
            Ok(changed)
        })
    }

    /// Drops entries whose parent entry vanished. Each sweep can orphan the
    /// next level down, so it loops to a fixpoint.
    pub fn delete_url_aliases_without_parent(&self) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let mut total = 0;
            loop {
                let changed = tx.execute(
                    "DELETE FROM url_alias WHERE parent != 0 \
                     AND parent NOT IN (SELECT id FROM url_alias)",
                    [],
                )?;
                total += changed;
                if changed == 0 {
                    return Ok(total);
                }
            }
        })
    }

    /// Drops history entries whose forward link no longer reaches an active
    /// entry.
    pub fn delete_url_aliases_with_broken_link(&self) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let changed = tx.execute(
                "DELETE FROM url_alias WHERE is_original = 0 \
                 AND link NOT IN (SELECT id FROM url_alias WHERE is_original = 1)",
                [],
            )?;
            Ok(changed)
        })
    }

    /// Collects NOP placeholders that no longer anchor any child. Removing a
    /// placeholder can leave its own NOP parent childless, hence the loop.
    pub fn delete_url_nop_aliases_without_children(&self) -> Result<usize> {
        self.with_immediate_tx(|tx| {
            let mut total = 0;
            loop {
                let changed = tx.execute(
                    "DELETE FROM url_alias WHERE action = 'nop:' \
                     AND id NOT IN (SELECT DISTINCT parent FROM url_alias)",
                    [],
                )?;
                total += changed;
                if changed == 0 {
                    return Ok(total);
                }
            }
        })
    }

    /// Reconciles one location's entries in a damaged store: duplicate active
    /// entries are demoted to history, and history links are re-pointed at
    /// the surviving active entry for their languages. Returns (links
    /// repaired, conflicting rows removed).
    pub fn repair_broken_url_aliases_for_location(&self, node_id: i64) -> Result<(usize, usize)> {
        self.with_immediate_tx(|tx| repair_location_tx(tx, node_id))
    }

    /// Runs every repair pass across the store and reports the totals.
    pub fn doctor(&self) -> Result<DoctorSummary> {
        let mut summary = DoctorSummary {
            aliases_without_location: self.delete_url_aliases_without_location()?,
            aliases_without_parent: self.delete_url_aliases_without_parent()?,
            broken_links_removed: self.delete_url_aliases_with_broken_link()?,
            nop_aliases_pruned: self.delete_url_nop_aliases_without_children()?,
            ..DoctorSummary::default()
        };
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT node_id FROM location ORDER BY node_id")?;
        let nodes = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        drop(conn);
        for node in nodes {
            let (repaired, removed) = self.repair_broken_url_aliases_for_location(node)?;
            summary.links_repaired += repaired;
            summary.conflicting_rows_removed += removed;
        }
        if summary.is_clean() {
            debug!("doctor found nothing to repair");
        } else {
            warn!(?summary, "doctor repaired alias table");
        }
        Ok(summary)
    }
}

fn repair_location_tx(
    tx: &rusqlite::Transaction<'_>,
    node_id: i64,
) -> Result<(usize, usize)> {
    let action = Action::Node(node_id);
    let mut repaired = 0;
    let mut removed = 0;

    // Demote conflicting active entries; the oldest id wins. Two entries
    // conflict when they occupy one slot, or when their language bits overlap
    // anywhere (one active URL per language per location).
    let mut keepers: Vec<AliasRow> = Vec::new();
    let mut originals: Vec<AliasRow> = load_rows_for_action(tx, &action, true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    originals.sort_by_key(|row| row.id.raw());
    for row in &originals {
        let conflicting = keepers.iter().find(|keeper| {
            (keeper.parent == row.parent && keeper.text_md5 == row.text_md5)
                || keeper.lang_mask.language_bits() & row.lang_mask.language_bits() != 0
        });
        match conflicting {
            None => {
                keepers.push(row.clone());
            }
            Some(keeper) => {
                let keeper = keeper.id;
                let fresh = crate::engine::alias::next_alias_id(tx)?;
                let demotion = tx.execute(
                    "UPDATE url_alias SET id = ?1, link = ?2, is_original = 0 \
                     WHERE parent = ?3 AND text_md5 = ?4 AND id = ?5",
                    params![
                        fresh.raw(),
                        keeper.raw(),
                        row.parent.raw(),
                        row.text_md5,
                        row.id.raw()
                    ],
                );
                match demotion {
                    Ok(_) => repaired += 1,
                    // Id counter desync can make the fresh id collide with an
                    // existing row; the duplicate is unrecoverable then.
                    Err(err) if is_unique_violation(&err) => {
                        tx.execute(
                            "DELETE FROM url_alias \
                             WHERE parent = ?1 AND text_md5 = ?2 AND id = ?3",
                            params![row.parent.raw(), row.text_md5, row.id.raw()],
                        )?;
                        removed += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    // Re-point history links at an active entry serving the same languages.
    let survivors: Vec<AliasRow> = load_rows_for_action(tx, &action, true)?
        .into_iter()
        .filter(|row| !row.is_alias)
        .collect();
    if survivors.is_empty() {
        return Ok((repaired, removed));
    }
    let survivor_ids: HashSet<i64> = survivors.iter().map(|row| row.id.raw()).collect();
    let history: Vec<AliasRow> = load_rows_for_action(tx, &action, false)?
        .into_iter()
        .filter(|row| !row.is_original && !survivor_ids.contains(&row.link.raw()))
        .collect();
    for row in history {
        let target = survivors
            .iter()
            .find(|survivor| survivor.lang_mask.intersects(row.lang_mask))
            .or_else(|| survivors.first())
            .map(|survivor| survivor.id);
        if let Some(target) = target {
            tx.execute(
                "UPDATE url_alias SET link = ?1 \
                 WHERE parent = ?2 AND text_md5 = ?3 AND id = ?4",
                params![target.raw(), row.parent.raw(), row.text_md5, row.id.raw()],
            )?;
            repaired += 1;
        }
    }
    Ok((repaired, removed))
}
