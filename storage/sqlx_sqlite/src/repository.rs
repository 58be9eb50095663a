use anyhow::Context;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repository {
    pool: Arc<SqlitePool>,
}

impl Repository {
    pub fn pool(&self) -> &SqlitePool {
        self.pool.as_ref()
    }

    #[cfg(not(test))]
    pub async fn new() -> anyhow::Result<Self> {
        use crate::configuration::Settings;

        let connect_options = Settings::connect_options()?;
        let pool = SqlitePool::connect_with(connect_options)
            .await
            .context("Failed to connect to DB")
            .map(Arc::new)?;

        Ok(Self { pool })
    }

    /// Safe to run on every cycle, the statement is a no-op once the table
    /// exists.
    pub async fn init_database_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS outages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                municipality TEXT NOT NULL,
                location TEXT NOT NULL,
                address TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                notified_24h INTEGER DEFAULT 0 CHECK(notified_24h IN (0, 1)),
                notified_24h_at TEXT,
                notified_1h INTEGER DEFAULT 0 CHECK(notified_1h IN (0, 1)),
                notified_1h_at TEXT,
                created_at TEXT DEFAULT (datetime('now', 'localtime')),
                UNIQUE(city, municipality, address, date, start_time)
            )",
        )
        .execute(self.pool())
        .await
        .context("Failed to initialize database schema")?;

        Ok(())
    }

    #[cfg(any(test, feature = "testing"))]
    pub async fn new_test_repo() -> Self {
        use sqlx::sqlite::SqlitePoolOptions;

        // A single connection keeps the in-memory database alive for the
        // whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory sqlite database");

        let test_repo = Self {
            pool: Arc::new(pool),
        };
        test_repo
            .init_database_schema()
            .await
            .expect("Failed to initialize the schema");

        test_repo
    }
}
