pub mod health;

use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::{handlers as auth_handlers, require_admin};
use crate::export::handlers as export_handlers;
use crate::listing::handlers as listing_handlers;
use crate::state::AppState;
use crate::submission::handlers as submission_handlers;

/// Multipart overhead allowed on top of the two file limits.
const FORM_FIELDS_ALLOWANCE: usize = 1024 * 1024;

/// Floor for the submission body size. Files over their own limit must still
/// arrive whole so the handler can name them in the error.
const MIN_SUBMISSION_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let limits = state.config.upload_limits;
    let body_limit = (limits.photo_max_bytes + limits.cv_max_bytes + FORM_FIELDS_ALLOWANCE)
        .max(MIN_SUBMISSION_BODY_BYTES);

    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/jobs", get(listing_handlers::handle_public_jobs))
        .route("/api/jobs/positions", get(listing_handlers::handle_positions))
        .route(
            "/api/applications",
            post(submission_handlers::handle_submit_application)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/admin/login", post(auth_handlers::handle_login));

    // Every route below requires a valid admin bearer token.
    let admin = Router::new()
        .route("/api/admin/logout", post(auth_handlers::handle_logout))
        .route(
            "/api/admin/applicants",
            get(listing_handlers::handle_list_applicants),
        )
        .route(
            "/api/admin/applicants/export",
            get(export_handlers::handle_export),
        )
        .route(
            "/api/admin/jobs",
            get(listing_handlers::handle_admin_jobs).post(listing_handlers::handle_create_job),
        )
        .route(
            "/api/admin/jobs/:id",
            put(listing_handlers::handle_update_job).delete(listing_handlers::handle_delete_job),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Anything that is not an API route is part of the single-page app.
    let static_dir = PathBuf::from(&state.config.static_dir);
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    public
        .merge(admin)
        .fallback_service(spa)
        .with_state(state)
}
