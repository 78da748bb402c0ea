//! HTTP JSON API.
//!
//! Reads are public. Task mutations need a signed-in user; SLA settings and
//! account management need an admin. Every mutation answers with the
//! re-fetched entity so clients can merge it without reloading.

mod auth;
mod board;
mod error;
mod settings;
mod tasks;
mod users;

use axum::{
    routing::{get, post},
    Router,
};
use halaltrack_core::Database;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ai::Analyzer;

pub use auth::{AdminUser, CurrentUser, MaybeUser, SignInRequest, SignInResponse};
pub use board::BoardColumn;
pub use error::{ApiError, ApiResult};
pub use tasks::{AdvanceResponse, TaskView};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub db: Database,
    pub analyzer: Analyzer,
}

pub fn create_router(db: Database, analyzer: Analyzer) -> Router {
    let context = AppContext { db, analyzer };

    let api = Router::new()
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/session", get(auth::session))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/advance", post(tasks::advance_task))
        .route("/tasks/{id}/hold", post(tasks::toggle_hold))
        .route(
            "/tasks/{id}/checklist/{item_id}/toggle",
            post(tasks::toggle_checklist_item),
        )
        .route("/tasks/{id}/analysis", post(tasks::analyze_task))
        .route("/board", get(board::board))
        .route("/stats", get(board::stats))
        .route(
            "/settings/sla",
            get(settings::get_sla).put(settings::save_sla),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", axum::routing::delete(users::delete_user));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(context)
}
