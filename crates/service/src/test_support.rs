#![cfg(test)]
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::connect_with_config;
use configs::DatabaseConfig;
use std::path::PathBuf;

/// Fresh migrated SQLite database in its own temp directory.
/// Returns the directory so the caller can remove it when done.
pub async fn get_db() -> Result<(DatabaseConnection, PathBuf), anyhow::Error> {
    let dir = std::env::temp_dir().join(format!("bus_admin_svc_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    let cfg = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.join("svc.sqlite").display()),
        max_connections: 5,
        ..DatabaseConfig::default()
    };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok((db, dir))
}
