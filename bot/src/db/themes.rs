use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// A stored theme row. `data` holds the ServerSnapshot JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThemeRow {
    pub server_id: String,
    pub name: String,
    pub data: String,
    pub saved_at: String,
}

/// Fetch a server's full catalog in insertion order. An absent catalog is
/// simply the empty vec.
pub async fn find_catalog(
    pool: &SqlitePool,
    server_id: &str,
) -> Result<Vec<ThemeRow>, sqlx::Error> {
    sqlx::query_as::<_, ThemeRow>("SELECT * FROM themes WHERE server_id = ? ORDER BY rowid")
        .bind(server_id)
        .fetch_all(pool)
        .await
}

/// Number of themes in a server's catalog.
pub async fn count_themes(pool: &SqlitePool, server_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM themes WHERE server_id = ?")
        .bind(server_id)
        .fetch_one(pool)
        .await
}

/// List theme names in insertion order.
pub async fn list_theme_names(
    pool: &SqlitePool,
    server_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM themes WHERE server_id = ? ORDER BY rowid")
        .bind(server_id)
        .fetch_all(pool)
        .await
}

/// Get one theme by exact name.
pub async fn get_theme(
    pool: &SqlitePool,
    server_id: &str,
    name: &str,
) -> Result<Option<ThemeRow>, sqlx::Error> {
    sqlx::query_as::<_, ThemeRow>("SELECT * FROM themes WHERE server_id = ? AND name = ?")
        .bind(server_id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Append a theme to a server's catalog, creating the catalog implicitly on
/// the first save.
pub async fn insert_theme(
    pool: &SqlitePool,
    server_id: &str,
    name: &str,
    data_json: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO themes (server_id, name, data, saved_at) VALUES (?, ?, ?, ?)")
        .bind(server_id)
        .bind(name)
        .bind(data_json)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a theme by name. Returns true if a row was deleted. Relative order
/// of the remaining themes is unchanged (rowids are untouched).
pub async fn pull_theme(
    pool: &SqlitePool,
    server_id: &str,
    name: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM themes WHERE server_id = ? AND name = ?")
        .bind(server_id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
