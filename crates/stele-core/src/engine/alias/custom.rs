//! User-authored aliases: custom location aliases and global resource
//! aliases. Missing intermediate path levels are filled with NOP placeholder
//! rows, which exist purely as branch points and are collected once
//! childless.

use super::*;

impl Repository {
    /// Creates a custom alias at `path` pointing to a location. `forwarding`
    /// makes traversal redirect to the location's canonical URL instead of
    /// resolving in place.
    pub fn create_custom_url_alias(
        &self,
        node_id: i64,
        path: &str,
        language_code: &str,
        forwarding: bool,
        always_available: bool,
    ) -> Result<AliasRow> {
        let language = self.language_id(language_code)?;
        let mask = LanguageMask::indicator(language, always_available);
        self.with_immediate_tx(|tx| {
            create_alias_at_path(tx, path, &Action::Node(node_id), mask, forwarding)
        })
    }

    /// Creates a global alias pointing at a virtual resource (no location),
    /// e.g. `content/search`.
    pub fn create_global_url_alias(
        &self,
        resource: &str,
        path: &str,
        language_code: &str,
        forwarding: bool,
        always_available: bool,
    ) -> Result<AliasRow> {
        let language = self.language_id(language_code)?;
        let mask = LanguageMask::indicator(language, always_available);
        let action = Action::Module(resource.to_string());
        self.with_immediate_tx(|tx| create_alias_at_path(tx, path, &action, mask, forwarding))
    }

    /// Removes a custom alias entry. An entry that still anchors children is
    /// downgraded to a NOP branch point so the children keep resolving.
    pub fn remove_custom_url_alias(&self, id: AliasId) -> Result<()> {
        self.with_immediate_tx(|tx| {
            let row = load_rows_by_id(tx, id)?
                .into_iter()
                .find(|row| row.is_alias)
                .ok_or_else(|| {
                    StorageError::UrlNotFound(format!("custom alias entry {id}"))
                })?;
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
            Ok(())
        })
    }
}

fn create_alias_at_path(
    conn: &Connection,
    path: &str,
    action: &Action,
    mask: LanguageMask,
    forwarding: bool,
) -> Result<AliasRow> {
    let segments: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|seg| !seg.is_empty())
        .collect();
    let Some((last, ancestors)) = segments.split_last() else {
        return Err(
            StorageError::InvalidAliasPath(path.to_string(), "path is empty".to_string()).into(),
        );
    };

    let mut parent = ROOT_PARENT;
    for segment in ancestors {
        let md5 = text_md5(segment);
        let existing = load_rows_at(conn, parent, &md5)?
            .into_iter()
            .find(|row| row.is_original);
        parent = match existing {
            Some(row) => row.id,
            None => insert_alias_row(conn, NewAliasRow::nop(parent, segment))?.id,
        };
    }

    let md5 = text_md5(last);
    let occupant = load_rows_at(conn, parent, &md5)?
        .into_iter()
        .find(|row| row.is_original);
    match occupant {
        Some(row) if row.is_nop() => {
            // A placeholder can be promoted into the real endpoint.
            conn.execute(
                "UPDATE url_alias SET action = ?1, action_type = ?2, lang_mask = ?3, \
                 is_alias = 1, is_original = 1, alias_redirects = ?4, link = id \
                 WHERE parent = ?5 AND text_md5 = ?6 AND id = ?7",
                params![
                    action.encode(),
                    action.kind().as_ref(),
                    mask.raw() as i64,
                    forwarding as i64,
                    parent.raw(),
                    md5,
                    row.id.raw()
                ],
            )?;
            Ok(AliasRow {
                action: action.clone(),
                lang_mask: mask,
                is_alias: true,
                is_original: true,
                alias_redirects: forwarding,
                link: row.id,
                ..row
            })
        }
        Some(_) => Err(StorageError::InvalidAliasPath(
            path.to_string(),
            format!("segment '{last}' is already in use"),
        )
        .into()),
        None => insert_alias_row(
            conn,
            NewAliasRow::custom(parent, last, action.clone(), mask, forwarding),
        ),
    }
}
