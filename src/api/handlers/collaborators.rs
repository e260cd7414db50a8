//! Collaborator management handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{AddCollaboratorRequest, CollaboratorDto};
use crate::app_state::AppState;
use crate::domain::BoardId;
use crate::error::{ErrorResponse, GatewayError};

/// Roles a collaborator can hold.
const VALID_ROLES: [&str; 2] = ["editor", "viewer"];

/// `POST /boards/{board_id}/collaborators` — Add a collaborator.
///
/// # Errors
///
/// Returns [`GatewayError::BoardNotFound`] for unknown boards and
/// [`GatewayError::InvalidRequest`] for duplicates or unknown roles.
#[utoipa::path(
    post,
    path = "/api/v1/boards/{board_id}/collaborators",
    tag = "Collaborators",
    summary = "Add a collaborator to a board",
    request_body = AddCollaboratorRequest,
    params(
        ("board_id" = String, Path, description = "Board identifier"),
    ),
    responses(
        (status = 201, description = "Collaborator added", body = CollaboratorDto),
        (status = 400, description = "Duplicate collaborator or invalid role", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse),
    )
)]
pub async fn add_collaborator(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let board_id = BoardId::parse(&board_id)?;
    if req.user_id.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "user_id is required".to_string(),
        ));
    }

    let role = req.role.as_deref().unwrap_or("editor");
    if !VALID_ROLES.contains(&role) {
        return Err(GatewayError::InvalidRequest(format!(
            "unknown role: {role}"
        )));
    }

    let row = state
        .store
        .add_collaborator(&board_id, &req.user_id, role)
        .await?;

    tracing::info!(%board_id, user = %req.user_id, role, "collaborator added");
    Ok((StatusCode::CREATED, Json(CollaboratorDto::from(row))))
}

/// `DELETE /boards/{board_id}/collaborators/{user_id}` — Remove a collaborator.
///
/// # Errors
///
/// Returns [`GatewayError::BoardNotFound`] when no such collaboration exists.
#[utoipa::path(
    delete,
    path = "/api/v1/boards/{board_id}/collaborators/{user_id}",
    tag = "Collaborators",
    summary = "Remove a collaborator from a board",
    params(
        ("board_id" = String, Path, description = "Board identifier"),
        ("user_id" = String, Path, description = "Collaborating user id"),
    ),
    responses(
        (status = 204, description = "Collaborator removed"),
        (status = 404, description = "No such collaboration", body = ErrorResponse),
    )
)]
pub async fn remove_collaborator(
    State(state): State<AppState>,
    Path((board_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let board_id = BoardId::parse(&board_id)?;
    state.store.remove_collaborator(&board_id, &user_id).await?;
    tracing::info!(%board_id, user = %user_id, "collaborator removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Collaborator routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/boards/{board_id}/collaborators", post(add_collaborator))
        .route(
            "/boards/{board_id}/collaborators/{user_id}",
            delete(remove_collaborator),
        )
}
