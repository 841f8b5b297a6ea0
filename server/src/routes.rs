// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::repository::Repository;
use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state: the configured persistence backend.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn Repository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &dyn Repository {
        &*self.repo
    }
}

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Task registry
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        // Status store
        .route(
            "/api/tasks/{id}/status",
            get(handlers::get_status).put(handlers::set_status),
        )
        .route("/api/tasks/{id}/history", get(handlers::task_history))
        .route("/api/statuses", get(handlers::list_statuses))
        .route("/api/statuses/palette", get(handlers::status_palette))
        .route("/api/history", get(handlers::list_history))
        .route("/api/history/{id}", delete(handlers::delete_history_record))
        // Statistics
        .route("/api/stats/daily", get(handlers::daily_stats))
        .route("/api/stats/monthly", get(handlers::monthly_stats))
        .route("/api/stats/summary", get(handlers::stats_summary))
        .layer(TraceLayer::new_for_http())
        // Adds the repository to the application state
        .with_state(state)
}
