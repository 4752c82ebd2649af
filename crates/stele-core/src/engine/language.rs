//! Language registry: maps language codes to their mask bits.

use super::*;

impl Repository {
    /// Registers a language code, assigning the next free bit. Idempotent
    /// for already-known codes. The 64th registration fails: bit 0 is
    /// reserved and the mask column is one 64-bit word.
    pub fn register_language(&self, code: &str) -> Result<LanguageId> {
        self.with_immediate_tx(|tx| {
            if let Some(id) = lookup_language(tx, code)? {
                return Ok(id);
            }
            let used: i64 =
                tx.query_row("SELECT COUNT(*) FROM content_language", [], |row| row.get(0))?;
            let position = u32::try_from(used + 1).unwrap_or(u32::MAX);
            let id = LanguageId::from_position(position).map_err(StorageError::Language)?;
            tx.execute(
                "INSERT INTO content_language (id, code) VALUES (?1, ?2)",
                params![id.raw() as i64, code],
            )?;
            debug!(code, id = id.raw(), "registered language");
            Ok(id)
        })
    }

    pub fn language_id(&self, code: &str) -> Result<LanguageId> {
        let conn = self.connection()?;
        lookup_language(&conn, code)?.ok_or_else(|| {
            StorageError::Language(LanguageError::UnknownLanguage(code.to_string())).into()
        })
    }

    /// Resolves a priority list of codes, preserving order.
    pub fn language_ids(&self, codes: &[String]) -> Result<Vec<LanguageId>> {
        let conn = self.connection()?;
        codes
            .iter()
            .map(|code| {
                lookup_language(&conn, code)?.ok_or_else(|| {
                    StorageError::Language(LanguageError::UnknownLanguage(code.clone())).into()
                })
            })
            .collect()
    }

    /// Resolves a decoded language set back to its registered codes, in
    /// registry order. Bits with no registered language are dropped.
    pub fn language_codes(&self, set: &LanguageSet) -> Result<Vec<String>> {
        let registry = self.list_languages()?;
        Ok(registry
            .into_iter()
            .filter(|(_, id)| set.languages.contains(id))
            .map(|(code, _)| code)
            .collect())
    }

    pub fn list_languages(&self) -> Result<Vec<(String, LanguageId)>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT code, id FROM content_language ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(code, raw)| {
                let id = LanguageId::new(raw as u64).map_err(StorageError::Language)?;
                Ok((code, id))
            })
            .collect()
    }
}

fn lookup_language(conn: &Connection, code: &str) -> Result<Option<LanguageId>> {
    let raw = conn
        .query_row(
            "SELECT id FROM content_language WHERE code = ?1",
            params![code],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match raw {
        Some(raw) => {
            let id = LanguageId::new(raw as u64).map_err(StorageError::Language)?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}
