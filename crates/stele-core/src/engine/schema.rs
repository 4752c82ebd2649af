//! Store layout: schema creation, meta versioning, integrity validation.

use super::*;

const EXPECTED_TABLES: [&str; 7] = [
    "meta",
    "content_language",
    "url_alias",
    "url_alias_seq",
    "location",
    "contentobject",
    "location_trash",
];

impl Repository {
    pub(super) fn ensure_layout(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }
        let mut conn = self.connection_raw()?;
        self.init_schema(&conn)?;
        self.ensure_meta(&mut conn)?;
        self.validate(&conn)?;
        self.ensure_root(&mut conn)?;
        Ok(())
    }

    fn init_schema(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS content_language (
                id INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS url_alias (
                id INTEGER NOT NULL,
                link INTEGER NOT NULL,
                parent INTEGER NOT NULL,
                text TEXT NOT NULL,
                text_md5 TEXT NOT NULL,
                action TEXT NOT NULL,
                action_type TEXT NOT NULL,
                lang_mask INTEGER NOT NULL,
                is_alias INTEGER NOT NULL DEFAULT 0,
                is_original INTEGER NOT NULL DEFAULT 0,
                alias_redirects INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (parent, text_md5, id)
            );
            CREATE INDEX IF NOT EXISTS url_alias_action ON url_alias (action, is_original);
            CREATE INDEX IF NOT EXISTS url_alias_id ON url_alias (id);
            CREATE INDEX IF NOT EXISTS url_alias_link ON url_alias (link);
            CREATE TABLE IF NOT EXISTS url_alias_seq (
                value INTEGER NOT NULL
            );
            -- AUTOINCREMENT: a deleted node's id must never come back, or
            -- trash rows and alias actions would point at an unrelated node.
            CREATE TABLE IF NOT EXISTS location (
                node_id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_node_id INTEGER NOT NULL,
                path_string TEXT NOT NULL,
                is_hidden INTEGER NOT NULL DEFAULT 0,
                is_invisible INTEGER NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 0,
                remote_id TEXT NOT NULL UNIQUE,
                contentobject_id INTEGER NOT NULL,
                contentobject_version INTEGER NOT NULL DEFAULT 1,
                depth INTEGER NOT NULL,
                sort_field INTEGER NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 1,
                main_node_id INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS location_parent ON location (parent_node_id);
            CREATE INDEX IF NOT EXISTS location_path ON location (path_string);
            CREATE INDEX IF NOT EXISTS location_content ON location (contentobject_id);
            CREATE TABLE IF NOT EXISTS contentobject (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                section_id INTEGER NOT NULL DEFAULT 0,
                owner_id INTEGER NOT NULL DEFAULT 0,
                current_version INTEGER NOT NULL DEFAULT 1,
                always_available INTEGER NOT NULL DEFAULT 0,
                main_node_id INTEGER NOT NULL DEFAULT 0,
                published_at INTEGER NOT NULL DEFAULT 0,
                modified_at INTEGER NOT NULL DEFAULT 0,
                status INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS location_trash (
                node_id INTEGER PRIMARY KEY,
                parent_node_id INTEGER NOT NULL,
                path_string TEXT NOT NULL,
                is_hidden INTEGER NOT NULL,
                is_invisible INTEGER NOT NULL,
                priority INTEGER NOT NULL,
                remote_id TEXT NOT NULL,
                contentobject_id INTEGER NOT NULL,
                contentobject_version INTEGER NOT NULL,
                depth INTEGER NOT NULL,
                sort_field INTEGER NOT NULL,
                sort_order INTEGER NOT NULL,
                main_node_id INTEGER NOT NULL,
                original_parent_id INTEGER NOT NULL,
                trashed_at INTEGER NOT NULL
            );
            "#,
        )
        .context("failed to initialize store schema")?;
        let seq_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM url_alias_seq", [], |row| row.get(0))?;
        if seq_rows == 0 {
            conn.execute("INSERT INTO url_alias_seq (value) VALUES (0)", [])?;
        }
        Ok(())
    }

    fn ensure_meta(&self, conn: &mut Connection) -> Result<()> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to start store meta transaction")?;
        tx.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params![META_KEY_FORMAT_VERSION, STORE_FORMAT_VERSION.to_string()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params![META_KEY_SCHEMA_VERSION, SCHEMA_VERSION.to_string()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params![META_KEY_CREATED_BY, STELE_VERSION],
        )?;
        tx.execute(
            "INSERT INTO meta(key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![META_KEY_LAST_USED, STELE_VERSION],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        self.run_integrity_check(conn)?;
        self.assert_expected_tables(conn)?;
        self.enforce_meta_version(conn, META_KEY_FORMAT_VERSION, STORE_FORMAT_VERSION)?;
        self.enforce_meta_version(conn, META_KEY_SCHEMA_VERSION, SCHEMA_VERSION)?;
        self.require_meta_presence(conn, META_KEY_CREATED_BY)?;
        self.require_meta_presence(conn, META_KEY_LAST_USED)?;
        Ok(())
    }

    fn run_integrity_check(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare("PRAGMA integrity_check")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let result: String = row.get(0)?;
            if !result.eq_ignore_ascii_case("ok") {
                return Err(StorageError::IndexCorrupt(result).into());
            }
        }
        Ok(())
    }

    fn assert_expected_tables(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")?;
        let found = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        let missing: Vec<&str> = EXPECTED_TABLES
            .iter()
            .copied()
            .filter(|name| !found.contains(*name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(
                StorageError::IndexCorrupt(format!("missing tables: {}", missing.join(", ")))
                    .into(),
            )
        }
    }

    fn meta_value(&self, conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(Into::into)
    }

    fn enforce_meta_version(&self, conn: &Connection, key: &str, expected: u32) -> Result<()> {
        let value = self
            .meta_value(conn, key)?
            .ok_or_else(|| StorageError::MissingMeta(key.to_string()))?;
        let parsed = value
            .parse::<u32>()
            .map_err(|_| StorageError::IncompatibleFormat {
                key: key.to_string(),
                expected: expected.to_string(),
                found: value.clone(),
            })?;
        if parsed != expected {
            return Err(StorageError::IncompatibleFormat {
                key: key.to_string(),
                expected: expected.to_string(),
                found: value,
            }
            .into());
        }
        Ok(())
    }

    fn require_meta_presence(&self, conn: &Connection, key: &str) -> Result<()> {
        self.meta_value(conn, key)?
            .ok_or_else(|| StorageError::MissingMeta(key.to_string()))?;
        Ok(())
    }

    /// Reads the meta table for display (`stele info`).
    pub fn store_meta(&self) -> Result<Vec<(String, String)>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT key, value FROM meta ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn ensure_root(&self, conn: &mut Connection) -> Result<()> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM location WHERE node_id = ?1",
                params![ROOT_NODE_ID],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Ok(());
        }
        let path = PathString::root(ROOT_NODE_ID);
        conn.execute(
            "INSERT INTO location (node_id, parent_node_id, path_string, remote_id, \
             contentobject_id, contentobject_version, depth, sort_field, sort_order, main_node_id) \
             VALUES (?1, 0, ?2, 'tree-root', 0, 1, ?3, 1, 1, ?1)",
            params![ROOT_NODE_ID, path.as_str(), path.depth()],
        )?;
        debug!(path = %self.db_path.display(), "store initialized with tree root");
        Ok(())
    }
}
