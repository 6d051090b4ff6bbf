use crate::db::{connect, migrate};
use anyhow::Result;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use std::path::PathBuf;
use uuid::Uuid;

/// Fresh SQLite file under the system temp dir, migrated to the latest schema.
pub async fn setup_test_db() -> Result<(DatabaseConnection, PathBuf)> {
    let dir = std::env::temp_dir().join(format!("bus_admin_models_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    let url = format!("sqlite://{}?mode=rwc", dir.join("test.sqlite").display());
    let db = connect(&url).await?;
    migrate(&db).await?;
    Ok((db, dir))
}

#[tokio::test]
async fn test_migrations_create_tables() -> Result<()> {
    let (db, dir) = setup_test_db().await?;

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name".to_owned(),
        ))
        .await?;
    let names: Vec<String> = rows
        .iter()
        .filter_map(|r| r.try_get::<String>("", "name").ok())
        .collect();
    assert!(names.iter().any(|n| n == "admin"));
    assert!(names.iter().any(|n| n == "bus"));

    let _ = std::fs::remove_dir_all(dir);
    Ok(())
}

#[tokio::test]
async fn test_migrate_twice_is_noop() -> Result<()> {
    let (db, dir) = setup_test_db().await?;
    migrate(&db).await?;
    let _ = std::fs::remove_dir_all(dir);
    Ok(())
}
