use thiserror::Error;

use crate::catalog::MAX_THEME_AMOUNT;

/// Failures surfaced by theme commands. The `Display` text is the
/// user-visible message; internal causes ride along as `#[source]` and are
/// logged for operators at the command boundary, never shown to users.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("This command can only be used in a server.")]
    NotInServerContext,

    #[error(
        "A server is allowed only up to {MAX_THEME_AMOUNT} saved themes. \
         Consider removing unneeded themes using /remove_theme."
    )]
    CapacityExceeded,

    #[error("A theme with the name '{0}' already exists. Please choose a different name.")]
    DuplicateName(String),

    #[error("Theme '{0}' not found.")]
    ThemeNotFound(String),

    #[error("No themes saved for this server.")]
    NoThemes,

    #[error("Failed to access saved themes. Please try again later.")]
    Persistence(#[source] sqlx::Error),

    #[error("Failed to apply changes to the server. Please try again later.")]
    Platform(#[source] anyhow::Error),
}

impl From<sqlx::Error> for ThemeError {
    fn from(e: sqlx::Error) -> Self {
        ThemeError::Persistence(e)
    }
}

impl From<anyhow::Error> for ThemeError {
    fn from(e: anyhow::Error) -> Self {
        ThemeError::Platform(e)
    }
}
