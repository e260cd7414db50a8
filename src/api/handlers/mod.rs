//! REST endpoint handlers organized by resource.

pub mod boards;
pub mod collaborators;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(boards::routes())
        .merge(collaborators::routes())
}
