//! SQLite persistence for roots, derivatives, schemes and transformation groups

use crate::error::{MizanError, Result};
use crate::roots::Derivative;
use crate::seed::SeedData;
use crate::transform::{TransformationGroup, TransformationRule};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SCHEME_CAPACITY_KEY: &str = "scheme_capacity";

/// Everything needed to rebuild the in-memory indices
#[derive(Debug, Default)]
pub struct StoredState {
    pub roots: Vec<(String, Vec<Derivative>)>,
    pub schemes: Vec<(String, String)>,
    /// Bucket count of the scheme table, once it has grown past the default
    pub scheme_capacity: Option<usize>,
    pub groups: Vec<TransformationGroup>,
}

pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open (or create) the database and make sure the tables exist
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MizanError::Storage(e.to_string()))?;
            }
        }
        let store = Self {
            db_path: db_path.to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a new connection (each call creates a new connection)
    fn connection(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS roots (
                text TEXT PRIMARY KEY
            );

            -- rowid keeps first-seen order for each root's derivative list
            CREATE TABLE IF NOT EXISTS derivatives (
                root TEXT NOT NULL,
                word TEXT NOT NULL,
                frequency INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (root, word)
            );

            CREATE TABLE IF NOT EXISTS schemes (
                name TEXT PRIMARY KEY,
                template TEXT NOT NULL
            );

            -- rules are stored as a JSON array
            CREATE TABLE IF NOT EXISTS transformation_groups (
                key TEXT PRIMARY KEY,
                comment TEXT,
                rules TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// True when no roots and no schemes have been stored yet
    pub fn is_empty(&self) -> Result<bool> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM roots) + (SELECT COUNT(*) FROM schemes)",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    /// Write a full seed in one transaction
    pub fn import(&self, seed: &SeedData) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        for root in &seed.roots {
            tx.execute("INSERT OR IGNORE INTO roots (text) VALUES (?1)", params![root])?;
        }
        for (name, template) in &seed.schemes {
            tx.execute(
                "INSERT INTO schemes (name, template) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET template = excluded.template",
                params![name, template],
            )?;
        }
        for group in &seed.groups {
            Self::upsert_group(&tx, group)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_root(&self, text: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("INSERT OR IGNORE INTO roots (text) VALUES (?1)", params![text])?;
        Ok(())
    }

    /// Record one occurrence of each word (in order) for `root`
    pub fn record_derivatives(&self, root: &str, words: &[String]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute("INSERT OR IGNORE INTO roots (text) VALUES (?1)", params![root])?;
        for word in words {
            tx.execute(
                "INSERT INTO derivatives (root, word, frequency) VALUES (?1, ?2, 1)
                 ON CONFLICT(root, word) DO UPDATE SET frequency = frequency + 1",
                params![root, word],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Upsert a scheme together with the scheme table capacity after the put.
    ///
    /// Schemes reload in rowid order into a table of this capacity, so bucket
    /// order (and with it validation order) is the same after a restart.
    pub fn put_scheme(&self, name: &str, template: &str, capacity: usize) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO schemes (name, template) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET template = excluded.template",
            params![name, template],
        )?;
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SCHEME_CAPACITY_KEY, capacity.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_scheme(&self, name: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM schemes WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn upsert_group(conn: &Connection, group: &TransformationGroup) -> Result<()> {
        let rules = serde_json::to_string(&group.rules)?;
        conn.execute(
            "INSERT INTO transformation_groups (key, comment, rules) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET comment = excluded.comment, rules = excluded.rules",
            params![group.key, group.comment, rules],
        )?;
        Ok(())
    }

    pub fn save_group(&self, group: &TransformationGroup) -> Result<()> {
        let conn = self.connection()?;
        Self::upsert_group(&conn, group)
    }

    pub fn delete_group(&self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM transformation_groups WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn load(&self) -> Result<StoredState> {
        let conn = self.connection()?;

        let mut derivatives: HashMap<String, Vec<Derivative>> = HashMap::new();
        let rows = conn
            .prepare("SELECT root, word, frequency FROM derivatives ORDER BY rowid")?
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (root, word, frequency) in rows {
            derivatives
                .entry(root)
                .or_default()
                .push(Derivative { word, frequency });
        }

        let root_texts = conn
            .prepare("SELECT text FROM roots ORDER BY rowid")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let roots = root_texts
            .into_iter()
            .map(|text| {
                let list = derivatives.remove(&text).unwrap_or_default();
                (text, list)
            })
            .collect();

        let schemes = conn
            .prepare("SELECT name, template FROM schemes ORDER BY rowid")?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

        let scheme_capacity = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SCHEME_CAPACITY_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|value| value.parse::<usize>().ok());

        let raw_groups = conn
            .prepare("SELECT key, comment, rules FROM transformation_groups ORDER BY key")?
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut groups = Vec::with_capacity(raw_groups.len());
        for (key, comment, rules_json) in raw_groups {
            let rules: Vec<TransformationRule> = serde_json::from_str(&rules_json)?;
            groups.push(TransformationGroup { key, rules, comment });
        }

        Ok(StoredState {
            roots,
            schemes,
            scheme_capacity,
            groups,
        })
    }
}
