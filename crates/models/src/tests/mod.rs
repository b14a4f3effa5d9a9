
use sea_orm::DatabaseConnection;

/// Fresh, migrated in-memory SQLite database per test.
pub(crate) async fn sqlite_db() -> anyhow::Result<DatabaseConnection> {
    let cfg = configs::DatabaseConfig::sqlite_memory();
    crate::db::connect_and_migrate(&cfg).await
}
