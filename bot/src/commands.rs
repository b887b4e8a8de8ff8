//! The five theme commands. Each produces exactly one user-visible message;
//! every failure is converted to a message at this boundary and the internal
//! cause is logged for operators.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

use crate::catalog::{self, MAX_THEME_AMOUNT};
use crate::error::ThemeError;
use crate::platform::GuildPlatform;
use crate::{capture, reconcile};

/// Where a command was invoked from. Commands that touch a server require
/// `server_id`; outside a server they fail without any state change.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub server_id: Option<String>,
}

impl CommandContext {
    pub fn in_server(server_id: impl Into<String>) -> Self {
        Self {
            server_id: Some(server_id.into()),
        }
    }

    fn require_server(&self) -> Result<&str, ThemeError> {
        self.server_id
            .as_deref()
            .ok_or(ThemeError::NotInServerContext)
    }
}

/// Per-server command serialization. Two commands against the same server
/// take the same guard and therefore run one after the other; commands
/// against different servers proceed independently.
#[derive(Default)]
pub struct ServerLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ServerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_server(&self, server_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(server_id.to_string())
            .or_default()
            .clone()
    }
}

/// Capture the live server and save it under `theme_name`.
pub async fn save_theme<P: GuildPlatform>(
    db: &SqlitePool,
    locks: &ServerLocks,
    platform: &P,
    ctx: &CommandContext,
    theme_name: &str,
) -> Result<String, ThemeError> {
    let server_id = ctx.require_server()?;
    let lock = locks.for_server(server_id);
    let _guard = lock.lock().await;

    let snapshot = capture::capture(platform).await?;
    catalog::save_theme(db, server_id, theme_name, &snapshot).await?;

    Ok(format!("Theme '{theme_name}' saved successfully!"))
}

/// Load a saved theme and reconcile the live server toward it.
pub async fn load_theme<P: GuildPlatform>(
    db: &SqlitePool,
    locks: &ServerLocks,
    platform: &P,
    ctx: &CommandContext,
    theme_name: &str,
) -> Result<String, ThemeError> {
    let server_id = ctx.require_server()?;
    let lock = locks.for_server(server_id);
    let _guard = lock.lock().await;

    let theme = catalog::get_theme(db, server_id, theme_name).await?;
    let report = reconcile::apply(platform, &theme.data).await?;

    info!(
        server_id,
        theme_name,
        mutations = report.mutations(),
        "theme loaded"
    );
    Ok(if report.branding_warning.is_some() {
        format!(
            "Theme '{theme_name}' loaded, but the server name, icon, or banner could not be updated."
        )
    } else {
        format!("Theme '{theme_name}' loaded successfully!")
    })
}

/// Remove a saved theme by name.
pub async fn remove_theme(
    db: &SqlitePool,
    locks: &ServerLocks,
    ctx: &CommandContext,
    theme_name: &str,
) -> Result<String, ThemeError> {
    let server_id = ctx.require_server()?;
    let lock = locks.for_server(server_id);
    let _guard = lock.lock().await;

    catalog::remove_theme(db, server_id, theme_name).await?;
    Ok(format!("Theme '{theme_name}' has been removed successfully."))
}

/// List the server's saved themes in storage order. Read-only, no lock.
pub async fn list_themes(
    db: &SqlitePool,
    ctx: &CommandContext,
) -> Result<String, ThemeError> {
    let server_id = ctx.require_server()?;
    let names = catalog::list_themes(db, server_id).await?;

    let mut message = String::from("**Saved themes for this server:**\n");
    for name in &names {
        message.push_str(&format!("- {name}\n"));
    }
    Ok(message.trim_end().to_string())
}

/// Describe the available commands. Works anywhere, even outside a server.
pub fn help() -> String {
    format!(
        "**Available commands:**\n\n\
         **/save_theme <theme_name>**\n> Save the current server state as a theme. \
         Max {MAX_THEME_AMOUNT} themes per server.\n\n\
         **/load_theme <theme_name>**\n> Load a previously saved theme for the server.\n\n\
         **/list_themes**\n> List all saved themes for the server.\n\n\
         **/remove_theme <theme_name>**\n> Remove a saved theme from the server.\n\n\
         **/help**\n> Display this list of commands."
    )
}
