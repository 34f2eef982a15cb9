// src/database.rs
use crate::models::{is_phone_sentinel, BusinessRecord, Result};
use mobc::{Manager, Pool};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info};

/// Durable store of records and of already-seen phone numbers. `insert` is a
/// single atomic unit per record; callers log failures and keep crawling.
#[async_trait::async_trait]
pub trait PersistenceSink {
    /// Every individual phone number currently on file, pipe-splitting
    /// applied and sentinels filtered out.
    async fn load_existing_phones(&self) -> Result<HashSet<String>>;

    /// Append one record. A failure affects that row only.
    async fn insert(&self, record: &BusinessRecord) -> Result<()>;
}

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        debug!("Creating SqliteManager for path: {}", db_path);
        Self { db_path }
    }
}

#[async_trait::async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let conn = Connection::open(&self.db_path)?;

        // Some PRAGMA statements return a row; run those through query_row.
        let exec_pragma = |conn: &Connection, pragma: &str| -> SqliteResult<()> {
            match conn.execute(pragma, []) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::ExecuteReturnedResults) => {
                    conn.query_row(pragma, [], |_| Ok(()))
                }
                Err(e) => Err(e),
            }
        };

        exec_pragma(&conn, "PRAGMA journal_mode=WAL")?;
        exec_pragma(&conn, "PRAGMA synchronous=NORMAL")?;
        exec_pragma(&conn, "PRAGMA temp_store=memory")?;

        init_schema(&conn)?;
        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> std::result::Result<Self::Connection, Self::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(conn)
    }
}

fn init_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS businesses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            specialty TEXT,
            phone_number TEXT,
            address TEXT,
            email TEXT,
            category TEXT,
            subcategory TEXT,
            subsidiary TEXT,
            gis TEXT,
            scraped_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_businesses_phone ON businesses(phone_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_businesses_category ON businesses(category, subcategory)",
        [],
    )?;
    Ok(())
}

pub type DbPool = Pool<SqliteManager>;

pub async fn create_db_pool(db_path: &str) -> Result<DbPool> {
    if let Some(parent) = Path::new(db_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(4).max_idle(2).build(manager);

    info!("✓ SQLite connection pool created: {}", db_path);
    Ok(pool)
}

/// `PersistenceSink` over the pooled SQLite database.
pub struct SqliteSink {
    pool: DbPool,
}

impl SqliteSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PersistenceSink for SqliteSink {
    async fn load_existing_phones(&self) -> Result<HashSet<String>> {
        let conn = self.pool.get().await?;

        let mut stmt = conn.prepare(
            "SELECT phone_number FROM businesses
             WHERE phone_number IS NOT NULL AND phone_number != ''",
        )?;
        let keys = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut existing = HashSet::new();
        for key in keys {
            let key = key?;
            if is_phone_sentinel(&key) {
                continue;
            }
            for number in key.split('|').filter(|n| !n.is_empty()) {
                existing.insert(number.trim().to_string());
            }
        }

        info!("📱 Loaded {} existing phone numbers", existing.len());
        Ok(existing)
    }

    async fn insert(&self, record: &BusinessRecord) -> Result<()> {
        let conn = self.pool.get().await?;

        let gis = serde_json::to_string(&record.gis)?;
        let inserted = conn.execute(
            r#"
            INSERT INTO businesses
            (name, specialty, phone_number, address, email,
             category, subcategory, subsidiary, gis, scraped_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.name,
                record.specialty,
                record.phone_key,
                record.address,
                record.email,
                record.category_name,
                record.subcategory_name,
                record.subsidiary_name,
                gis,
                record.scraped_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                debug!("💾 Saved: {}", record.name);
                Ok(())
            }
            Err(e) => {
                error!("❌ DB error while saving '{}': {}", record.name, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GisPoint, NO_EMAIL_FOUND, NO_PHONE_FOUND};
    use chrono::Utc;

    fn sample(name: &str, phone_key: &str) -> BusinessRecord {
        BusinessRecord {
            name: name.into(),
            specialty: "testing | none".into(),
            phone_key: phone_key.into(),
            address: "somewhere".into(),
            email: NO_EMAIL_FOUND.into(),
            category_name: "cat".into(),
            subcategory_name: "subcat".into(),
            subsidiary_name: "sub".into(),
            gis: GisPoint { lat: Some(35.7), lon: Some(51.4) },
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_load_splits_pipe_joined_keys() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = create_db_pool(db_path.to_str().unwrap()).await.unwrap();
        let sink = SqliteSink::new(pool);

        sink.insert(&sample("a", "0912|0913")).await.unwrap();
        sink.insert(&sample("b", "0921")).await.unwrap();
        sink.insert(&sample("c", NO_PHONE_FOUND)).await.unwrap();

        let phones = sink.load_existing_phones().await.unwrap();
        let expected: HashSet<String> =
            ["0912", "0913", "0921"].iter().map(|s| s.to_string()).collect();
        assert_eq!(phones, expected);
    }

    #[tokio::test]
    async fn gis_round_trips_as_fixed_shape_json() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = create_db_pool(db_path.to_str().unwrap()).await.unwrap();
        let sink = SqliteSink::new(pool.clone());

        sink.insert(&sample("a", "0912")).await.unwrap();

        let conn = pool.get().await.unwrap();
        let gis: String = conn
            .query_row("SELECT gis FROM businesses WHERE name = 'a'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(gis, r#"{"lat":35.7,"lon":51.4}"#);
    }
}
