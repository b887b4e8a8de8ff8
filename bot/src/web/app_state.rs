use sqlx::SqlitePool;

use crate::commands::ServerLocks;
use crate::platform::rest::RestClient;

/// Shared state for the HTTP command surface.
pub struct AppState {
    pub db: SqlitePool,
    pub locks: ServerLocks,
    pub rest: RestClient,
}
