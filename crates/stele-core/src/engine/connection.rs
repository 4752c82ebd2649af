//! SQLite connection + transaction helpers.

use super::*;

impl Repository {
    pub(super) fn connection(&self) -> Result<Connection> {
        let conn = self.connection_raw()?;
        conn.busy_timeout(Duration::from_secs(10))
            .context("failed to set busy timeout for store")?;
        Ok(conn)
    }

    /// Runs `f` inside one immediate transaction. Every mutating sequence
    /// (historize-then-insert, move-then-relink, swap) goes through here so
    /// readers never observe a half-applied pair.
    pub(super) fn with_immediate_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to start store transaction")?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub(super) fn connection_raw(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("failed to open store at {}", self.db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL for store")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("failed to enable foreign keys for store")?;
        Ok(conn)
    }
}

/// Whether a rusqlite error is a unique/primary-key constraint violation.
/// Expected (and handled) only inside the repair passes.
pub(super) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(info, _)
            if info.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
