#![allow(dead_code)]

use std::path::PathBuf;

use dbunits::config::Config;
use dbunits::model::{Entity, ModelPackage};
use figment::Figment;
use figment::providers::{Format, Toml};
use tempfile::TempDir;

/// Entity used across the integration tests.
pub struct LedgerEntry;

impl Entity for LedgerEntry {
    const TABLE: &'static str = "ledger_entry";
    const COLUMNS: &'static [&'static str] = &["id", "amount", "created_by"];
    const DDL: &'static str = "CREATE TABLE IF NOT EXISTS ledger_entry (
        id INTEGER PRIMARY KEY NOT NULL,
        amount INTEGER NOT NULL,
        created_by TEXT NULL
    )";
}

pub fn ledger_package() -> ModelPackage {
    ModelPackage::new("ledger").register::<LedgerEntry>()
}

/// Temporary directory holding the SQLite files of one test.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub fn url(&self, file: &str) -> String {
        format!("sqlite:{}", self.path(file).display())
    }
}

pub fn config_from_toml(toml: &str) -> Config {
    Config::from_figment(&Figment::new().merge(Toml::string(toml))).expect("valid test config")
}

/// Single write unit with `ddl_auto = "create"` plus any extra TOML appended.
pub fn write_only_config(dir: &TestDir, extra: &str) -> Config {
    config_from_toml(&format!(
        r#"
        [write_datasource]
        url = "{url}"

        [write_datasource.pool]
        max_size = 4
        acquire_timeout_ms = 2000

        [mapping]
        ddl_auto = "create"
        {extra}
        "#,
        url = dir.url("write.db"),
    ))
}

pub async fn count_entries(pool: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entry")
        .fetch_one(pool)
        .await
        .expect("count ledger entries")
}
