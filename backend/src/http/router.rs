//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{accounts, directory, health, maintenance};
use super::state::AppState;

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/refresh", post(accounts::refresh))
        .route("/logout", post(accounts::logout))
}

fn core_routes() -> Router<AppState> {
    Router::new()
        // Companies
        .route(
            "/companies",
            get(directory::list_companies).post(directory::create_company),
        )
        .route("/companies/select", get(directory::company_options))
        .route(
            "/companies/{id}",
            get(directory::get_company)
                .put(directory::update_company)
                .delete(directory::delete_company),
        )
        // Departments
        .route(
            "/departments",
            get(directory::list_departments).post(directory::create_department),
        )
        .route("/departments/select", get(directory::department_options))
        .route(
            "/departments/{id}",
            get(directory::get_department)
                .put(directory::update_department)
                .delete(directory::delete_department),
        )
        // Equipment categories
        .route(
            "/equipment-categories",
            get(directory::list_categories).post(directory::create_category),
        )
        .route(
            "/equipment-categories/{id}",
            get(directory::get_category)
                .put(directory::update_category)
                .delete(directory::delete_category),
        )
        // Equipment
        .route(
            "/equipment",
            get(directory::list_equipment).post(directory::create_equipment),
        )
        .route("/equipment/select", get(directory::equipment_options))
        .route(
            "/equipment/{id}",
            get(directory::get_equipment)
                .put(directory::update_equipment)
                .delete(directory::delete_equipment),
        )
        // Work centers
        .route(
            "/work-centers",
            get(directory::list_work_centers).post(directory::create_work_center),
        )
        .route("/work-centers/select", get(directory::work_center_options))
        .route(
            "/work-centers/{id}",
            get(directory::get_work_center)
                .put(directory::update_work_center)
                .delete(directory::delete_work_center),
        )
        // Teams
        .route(
            "/teams",
            get(directory::list_teams).post(directory::create_team),
        )
        .route(
            "/teams/{id}",
            get(directory::get_team)
                .put(directory::update_team)
                .delete(directory::delete_team),
        )
}

fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(maintenance::list_requests).post(maintenance::create_request),
        )
        .route("/availability", post(maintenance::check_availability))
        .route("/reassign", post(maintenance::reassign))
        .route("/worklog", post(maintenance::add_work_log))
        .route(
            "/{id}",
            get(maintenance::get_request).put(maintenance::update_request),
        )
        .route("/{id}/worklogs", get(maintenance::list_work_logs))
        .route("/{id}/assignments", get(maintenance::list_assignments))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .nest("/accounts", account_routes())
        .nest("/core", core_routes())
        .nest("/maintenance", maintenance_routes());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
