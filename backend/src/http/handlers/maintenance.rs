//! `/api/maintenance` handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{body, created, CreatedResult, HandlerResult};
use crate::api::{MaintenanceAssignment, MaintenanceRequest, RequestDetails, RequestId, WorkLog};
use crate::auth::Principal;
use crate::http::state::AppState;
use crate::services::maintenance::{self, AvailabilityQuery, ReassignInput, WorkLogInput};
use crate::services::views::{
    self, AvailabilityView, ReassignmentView, RequestView, WorkLogView,
};

/// POST /api/maintenance/availability
///
/// Picks the technician a new request would get and lists free work centers.
/// Answers `409` when nobody in the team is free.
pub async fn check_availability(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<AvailabilityQuery>, JsonRejection>,
) -> HandlerResult<AvailabilityView> {
    let query = body(payload)?;
    let availability = maintenance::check_availability(state.repo(), &principal, &query).await?;
    Ok(Json(views::availability_view(state.repo(), availability).await?))
}

/// GET /api/maintenance
pub async fn list_requests(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<RequestView>> {
    let requests = maintenance::list_requests(state.repo(), &principal).await?;
    Ok(Json(views::request_views(state.repo(), requests).await?))
}

/// POST /api/maintenance
pub async fn create_request(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<RequestDetails>, JsonRejection>,
) -> CreatedResult<MaintenanceRequest> {
    let details = body(payload)?;
    created(maintenance::create_request(state.repo(), &principal, &details).await?)
}

/// GET /api/maintenance/{id}
pub async fn get_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<RequestId>,
) -> HandlerResult<RequestView> {
    let request = maintenance::get_request(state.repo(), &principal, id).await?;
    Ok(Json(views::request_view(state.repo(), request).await?))
}

/// PUT /api/maintenance/{id}
pub async fn update_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<RequestId>,
    payload: Result<Json<RequestDetails>, JsonRejection>,
) -> HandlerResult<MaintenanceRequest> {
    let details = body(payload)?;
    Ok(Json(
        maintenance::update_request(state.repo(), &principal, id, &details).await?,
    ))
}

/// POST /api/maintenance/reassign
pub async fn reassign(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<ReassignInput>, JsonRejection>,
) -> HandlerResult<ReassignmentView> {
    let input = body(payload)?;
    let reassignment = maintenance::reassign(state.repo(), &principal, &input).await?;
    Ok(Json(views::reassignment_view(state.repo(), reassignment).await?))
}

/// POST /api/maintenance/worklog
pub async fn add_work_log(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<WorkLogInput>, JsonRejection>,
) -> CreatedResult<WorkLog> {
    let input = body(payload)?;
    created(maintenance::add_work_log(state.repo(), &principal, &input).await?)
}

/// GET /api/maintenance/{id}/worklogs
pub async fn list_work_logs(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<RequestId>,
) -> HandlerResult<Vec<WorkLogView>> {
    let logs = maintenance::list_work_logs(state.repo(), &principal, id).await?;
    Ok(Json(views::work_log_views(state.repo(), logs).await?))
}

/// GET /api/maintenance/{id}/assignments
pub async fn list_assignments(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<RequestId>,
) -> HandlerResult<Vec<MaintenanceAssignment>> {
    Ok(Json(
        maintenance::list_assignments(state.repo(), &principal, id).await?,
    ))
}
