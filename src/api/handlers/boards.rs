//! Board CRUD and snapshot handlers.
//!
//! Thin storage-backed handlers: none of them touch live rooms, so a
//! board can be listed or deleted while clients are connected to it.
//! Identity is taken at face value from the request (authentication is
//! handled upstream of this gateway).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{BoardDto, CreateBoardRequest, SaveSnapshotRequest, SnapshotDto, UserParams};
use crate::app_state::AppState;
use crate::domain::{BoardId, DocumentState, SCHEMA_VERSION};
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::PersistenceGateway;

/// `GET /boards` — List boards a user owns or collaborates on.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when `user_id` is missing.
#[utoipa::path(
    get,
    path = "/api/v1/boards",
    tag = "Boards",
    summary = "List boards for a user",
    description = "Returns all boards the given user owns or collaborates on, most recently updated first.",
    params(UserParams),
    responses(
        (status = 200, description = "Board list", body = Vec<BoardDto>),
        (status = 400, description = "Missing user id", body = ErrorResponse),
    )
)]
pub async fn list_boards(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = params
        .user_id
        .ok_or_else(|| GatewayError::InvalidRequest("user_id is required".to_string()))?;

    let boards = state.store.list_boards(&user_id).await?;
    let data: Vec<BoardDto> = boards.into_iter().map(BoardDto::from).collect();
    Ok(Json(data))
}

/// `POST /boards` — Create a new board.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on an empty title.
#[utoipa::path(
    post,
    path = "/api/v1/boards",
    tag = "Boards",
    summary = "Create a board",
    request_body = CreateBoardRequest,
    responses(
        (status = 201, description = "Board created", body = BoardDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_board(
    State(state): State<AppState>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.title.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "title must not be empty".to_string(),
        ));
    }
    if req.user_id.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "user_id is required".to_string(),
        ));
    }

    let board_id = BoardId::random();
    let row = state
        .store
        .create_board(&board_id, req.title.trim(), &req.user_id)
        .await?;

    tracing::info!(%board_id, owner = %req.user_id, "board created");
    Ok((StatusCode::CREATED, Json(BoardDto::from(row))))
}

/// `DELETE /boards/{board_id}` — Delete a board (owner only).
///
/// # Errors
///
/// Returns [`GatewayError::BoardNotFound`] or [`GatewayError::Forbidden`].
#[utoipa::path(
    delete,
    path = "/api/v1/boards/{board_id}",
    tag = "Boards",
    summary = "Delete a board",
    description = "Deletes a board, its snapshot, and its collaborations. Only the owner may delete. A live room for the board is unaffected and ages out through normal eviction.",
    params(
        ("board_id" = String, Path, description = "Board identifier"),
        UserParams,
    ),
    responses(
        (status = 204, description = "Board deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Board not found", body = ErrorResponse),
    )
)]
pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let board_id = BoardId::parse(&board_id)?;
    let user_id = params
        .user_id
        .ok_or_else(|| GatewayError::InvalidRequest("user_id is required".to_string()))?;

    state.store.delete_board(&board_id, &user_id).await?;
    tracing::info!(%board_id, "board deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /boards/{board_id}/snapshot` — Fetch the latest persisted snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::SnapshotNotFound`] if none was ever saved.
#[utoipa::path(
    get,
    path = "/api/v1/boards/{board_id}/snapshot",
    tag = "Boards",
    summary = "Get the latest snapshot",
    params(
        ("board_id" = String, Path, description = "Board identifier"),
    ),
    responses(
        (status = 200, description = "Latest snapshot", body = SnapshotDto),
        (status = 404, description = "No snapshot for this board", body = ErrorResponse),
    )
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let board_id = BoardId::parse(&board_id)?;
    let snapshot = state
        .store
        .load(&board_id)
        .await?
        .ok_or_else(|| GatewayError::SnapshotNotFound(board_id.to_string()))?;

    Ok(Json(SnapshotDto {
        board_id: snapshot.board_id.to_string(),
        schema_version: snapshot.document.schema_version,
        data: snapshot.document.data,
        saved_at: snapshot.saved_at,
    }))
}

/// `POST /boards/{board_id}/snapshot` — Persist a snapshot from a client.
///
/// The WebSocket autosave path is the normal writer; this endpoint exists
/// for clients that flush on page unload.
///
/// # Errors
///
/// Returns [`GatewayError::SnapshotTooLarge`] when the payload exceeds
/// the configured limit.
#[utoipa::path(
    post,
    path = "/api/v1/boards/{board_id}/snapshot",
    tag = "Boards",
    summary = "Save a snapshot",
    request_body = SaveSnapshotRequest,
    params(
        ("board_id" = String, Path, description = "Board identifier"),
    ),
    responses(
        (status = 204, description = "Snapshot saved"),
        (status = 413, description = "Payload exceeds the size limit", body = ErrorResponse),
    )
)]
pub async fn put_snapshot(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(req): Json<SaveSnapshotRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let board_id = BoardId::parse(&board_id)?;

    let size = serde_json::to_vec(&req.data)
        .map_err(|e| GatewayError::InvalidRequest(format!("unserializable payload: {e}")))?
        .len();
    let limit = state.config.snapshot_max_bytes;
    if size > limit {
        return Err(GatewayError::SnapshotTooLarge { size, limit });
    }

    let document = DocumentState {
        schema_version: req.schema_version.unwrap_or(SCHEMA_VERSION),
        data: req.data,
    };
    state.store.save(&board_id, &document).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Board routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route("/boards/{board_id}", axum::routing::delete(delete_board))
        .route(
            "/boards/{board_id}/snapshot",
            get(get_snapshot).post(put_snapshot),
        )
}
