// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP API routing (§4.2).

mod error_files;
mod health;
mod index;
mod input;
mod output;
mod status;

use axum::routing::{delete, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health))
        .route("/input", get(input::upload_form).post(input::upload))
        .route("/input/:id", delete(input::delete))
        .route("/status", get(status::all))
        .route("/status/:id", get(status::one))
        .route("/error", get(error_files::list))
        .route("/error/:id", get(error_files::one))
        .route("/output", get(output::list))
        .route("/output/:id", get(output::one).delete(output::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
