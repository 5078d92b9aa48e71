use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use std::sync::{Mutex, MutexGuard};

use crate::store::repo::RuleRepository;

pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.migrate()?;
        Ok(repo)
    }

    pub fn open_in_memory() -> Result<Self> {
        let repo = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        repo.migrate()?;
        Ok(repo)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl RuleRepository for SqliteRepo {
    fn load_blob(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(r#"SELECT value FROM kv WHERE key=?1"#)?;
        let mut rows = stmt.query(params![key])?;
        if let Some(r) = rows.next()? {
            Ok(Some(r.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn store_blob(&self, key: &str, value: &str, revision_key: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            "#,
            params![key, value],
        )?;

        tx.execute(
            r#"
            INSERT INTO meta (key, value) VALUES (?1, 1)
            ON CONFLICT(key) DO UPDATE SET value=value + 1
            "#,
            params![revision_key],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get_meta_i64(&self, key: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(r#"SELECT value FROM meta WHERE key=?1"#)?;
        let mut rows = stmt.query(params![key])?;
        if let Some(r) = rows.next()? {
            Ok(Some(r.get(0)?))
        } else {
            Ok(None)
        }
    }
}
