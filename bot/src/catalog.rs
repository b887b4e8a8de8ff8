use sqlx::SqlitePool;
use tracing::info;

use crate::db::themes;
use crate::error::ThemeError;
use crate::snapshot::{ServerSnapshot, Theme};

/// Maximum number of themes a single server may keep saved.
pub const MAX_THEME_AMOUNT: usize = 25;

/// Save a snapshot under `theme_name` in the server's catalog. Rejects the
/// save if the catalog is full or the name is already taken; nothing is
/// persisted on rejection.
pub async fn save_theme(
    pool: &SqlitePool,
    server_id: &str,
    theme_name: &str,
    snapshot: &ServerSnapshot,
) -> Result<(), ThemeError> {
    let existing = themes::list_theme_names(pool, server_id).await?;
    if existing.len() >= MAX_THEME_AMOUNT {
        return Err(ThemeError::CapacityExceeded);
    }
    if existing.iter().any(|n| n == theme_name) {
        return Err(ThemeError::DuplicateName(theme_name.to_string()));
    }

    let data_json = serde_json::to_string(snapshot)
        .map_err(|e| ThemeError::Persistence(sqlx::Error::Encode(e.into())))?;
    themes::insert_theme(pool, server_id, theme_name, &data_json).await?;

    info!(server_id, theme_name, "theme saved");
    Ok(())
}

/// Remove a theme by name. The rest of the catalog keeps its order.
pub async fn remove_theme(
    pool: &SqlitePool,
    server_id: &str,
    theme_name: &str,
) -> Result<(), ThemeError> {
    let catalog = themes::find_catalog(pool, server_id).await?;
    if catalog.is_empty() {
        return Err(ThemeError::NoThemes);
    }
    if !themes::pull_theme(pool, server_id, theme_name).await? {
        return Err(ThemeError::ThemeNotFound(theme_name.to_string()));
    }

    info!(server_id, theme_name, "theme removed");
    Ok(())
}

/// List theme names in catalog storage order.
pub async fn list_themes(pool: &SqlitePool, server_id: &str) -> Result<Vec<String>, ThemeError> {
    let names = themes::list_theme_names(pool, server_id).await?;
    if names.is_empty() {
        return Err(ThemeError::NoThemes);
    }
    Ok(names)
}

/// Look up one theme by exact name and deserialize its snapshot.
pub async fn get_theme(
    pool: &SqlitePool,
    server_id: &str,
    theme_name: &str,
) -> Result<Theme, ThemeError> {
    let catalog = themes::find_catalog(pool, server_id).await?;
    if catalog.is_empty() {
        return Err(ThemeError::NoThemes);
    }
    let row = catalog
        .into_iter()
        .find(|r| r.name == theme_name)
        .ok_or_else(|| ThemeError::ThemeNotFound(theme_name.to_string()))?;

    let data: ServerSnapshot = serde_json::from_str(&row.data)
        .map_err(|e| ThemeError::Persistence(sqlx::Error::Decode(e.into())))?;
    Ok(Theme {
        name: row.name,
        data,
    })
}
