#![cfg(test)]
use sea_orm::DatabaseConnection;
use models::db::connect_and_migrate;

/// Fresh in-memory SQLite database with the todo schema applied.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = configs::DatabaseConfig::sqlite_memory();
    connect_and_migrate(&cfg).await
}

/// Unique JSON file path under the system temp dir.
pub fn temp_json_path(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{}_{}.json", prefix, uuid::Uuid::new_v4()))
}
