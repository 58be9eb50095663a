use serde::Deserialize;
use shared_kernel::configuration::config;
use sqlx::sqlite::SqliteConnectOptions;

#[derive(Debug, Deserialize)]
pub struct Settings {
    database: DbSettings,
}

#[derive(Debug, Deserialize)]
pub struct DbSettings {
    path: String,
}

impl Settings {
    fn parse() -> anyhow::Result<Self> {
        config::<Settings>()
    }

    pub fn connect_options() -> anyhow::Result<SqliteConnectOptions> {
        let config = Self::parse()?.database;
        Ok(SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true))
    }
}
