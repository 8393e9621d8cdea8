pub mod config;
pub mod error;
pub mod object_store;
pub mod provider;
pub mod provider_placeholder;
pub mod routes_kipp;
pub mod routes_projects;
pub mod routes_session;
pub mod routes_tasks;
pub mod routes_upload;
pub mod state;
pub mod store_exec;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(routes_projects::health))
        .route("/dashboard", get(routes_projects::get_dashboard))
        .route(
            "/projects",
            get(routes_projects::list_projects).post(routes_projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes_projects::get_project).patch(routes_projects::patch_project),
        )
        .route("/projects/:id/questionnaire", put(routes_projects::put_questionnaire))
        .route(
            "/projects/:id/kipp",
            get(routes_kipp::get_kipp).put(routes_kipp::put_kipp),
        )
        .route("/projects/:id/kipp/chat", post(routes_kipp::chat))
        .route(
            "/projects/:id/tasks",
            get(routes_tasks::list_tasks).post(routes_tasks::create_task),
        )
        .route("/tasks/:id", get(routes_tasks::get_task))
        .route("/tasks/:id/start", post(routes_tasks::start_task))
        .route("/tasks/:id/examples", get(routes_tasks::get_examples))
        .route("/tasks/:id/session", get(routes_session::get_session))
        .route("/tasks/:id/session/answers", put(routes_session::put_answer))
        .route("/tasks/:id/session/next", post(routes_session::next))
        .route("/tasks/:id/session/prev", post(routes_session::prev))
        .route("/tasks/:id/finalize", post(routes_session::finalize))
        .route("/api/s3/upload", post(routes_upload::upload))
        .route(
            "/api/s3/presign",
            get(routes_upload::presign).post(routes_upload::presign_for_file),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
