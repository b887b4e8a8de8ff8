use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;

use super::app_state::AppState;
use crate::commands::{self, CommandContext};
use crate::error::ThemeError;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn status_for(err: &ThemeError) -> StatusCode {
    match err {
        ThemeError::NotInServerContext => StatusCode::BAD_REQUEST,
        ThemeError::CapacityExceeded | ThemeError::DuplicateName(_) => StatusCode::CONFLICT,
        ThemeError::ThemeNotFound(_) | ThemeError::NoThemes => StatusCode::NOT_FOUND,
        ThemeError::Persistence(_) | ThemeError::Platform(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a command result into the single user-visible message. Internal
/// causes are logged here, never sent to the user.
fn respond(result: Result<String, ThemeError>) -> (StatusCode, Json<MessageResponse>) {
    match result {
        Ok(message) => (StatusCode::OK, Json(MessageResponse { message })),
        Err(err) => {
            error!(error = ?err, "theme command failed");
            (
                status_for(&err),
                Json(MessageResponse {
                    message: err.to_string(),
                }),
            )
        }
    }
}

pub async fn save_theme(
    State(state): State<Arc<AppState>>,
    Path((server_id, theme_name)): Path<(String, String)>,
) -> (StatusCode, Json<MessageResponse>) {
    let ctx = CommandContext::in_server(&server_id);
    let platform = state.rest.guild(&server_id);
    respond(commands::save_theme(&state.db, &state.locks, &platform, &ctx, &theme_name).await)
}

pub async fn load_theme(
    State(state): State<Arc<AppState>>,
    Path((server_id, theme_name)): Path<(String, String)>,
) -> (StatusCode, Json<MessageResponse>) {
    let ctx = CommandContext::in_server(&server_id);
    let platform = state.rest.guild(&server_id);
    respond(commands::load_theme(&state.db, &state.locks, &platform, &ctx, &theme_name).await)
}

pub async fn remove_theme(
    State(state): State<Arc<AppState>>,
    Path((server_id, theme_name)): Path<(String, String)>,
) -> (StatusCode, Json<MessageResponse>) {
    let ctx = CommandContext::in_server(&server_id);
    respond(commands::remove_theme(&state.db, &state.locks, &ctx, &theme_name).await)
}

pub async fn list_themes(
    State(state): State<Arc<AppState>>,
    Path(server_id): Path<String>,
) -> (StatusCode, Json<MessageResponse>) {
    let ctx = CommandContext::in_server(&server_id);
    respond(commands::list_themes(&state.db, &ctx).await)
}

pub async fn help() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: commands::help(),
    })
}
