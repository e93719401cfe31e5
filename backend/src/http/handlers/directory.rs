//! `/api/core` handlers for reference data.
//!
//! Reads are open to any authenticated caller and filtered by role; writes
//! are admin-only. The company and department select views are public.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::{body, created, CreatedResult, HandlerResult};
use crate::api::{
    CategoryId, Company, CompanyDraft, CompanyId, Department, DepartmentDraft, DepartmentId,
    Equipment, EquipmentCategory, EquipmentCategoryDraft, EquipmentDraft, EquipmentId,
    MaintenanceTeam, MaintenanceTeamDraft, TeamId, WorkCenter, WorkCenterDraft, WorkCenterId,
};
use crate::auth::Principal;
use crate::http::error::AppError;
use crate::http::state::AppState;
use crate::services::directory;
use crate::services::views::{
    self, CategoryView, EquipmentOption, EquipmentView, WorkCenterOption,
};

// =============================================================================
// Companies
// =============================================================================

/// GET /api/core/companies
pub async fn list_companies(
    State(state): State<AppState>,
    _principal: Principal,
) -> HandlerResult<Vec<Company>> {
    Ok(Json(directory::list_companies(state.repo()).await?))
}

/// POST /api/core/companies
pub async fn create_company(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<CompanyDraft>, JsonRejection>,
) -> CreatedResult<Company> {
    let draft = body(payload)?;
    created(directory::create_company(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/companies/{id}
pub async fn get_company(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<CompanyId>,
) -> HandlerResult<Company> {
    Ok(Json(directory::get_company(state.repo(), id).await?))
}

/// PUT /api/core/companies/{id}
pub async fn update_company(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CompanyId>,
    payload: Result<Json<CompanyDraft>, JsonRejection>,
) -> HandlerResult<Company> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_company(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/companies/{id}
pub async fn delete_company(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CompanyId>,
) -> Result<StatusCode, AppError> {
    directory::delete_company(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Departments
// =============================================================================

/// GET /api/core/departments
pub async fn list_departments(
    State(state): State<AppState>,
    _principal: Principal,
) -> HandlerResult<Vec<Department>> {
    Ok(Json(directory::list_departments(state.repo()).await?))
}

/// POST /api/core/departments
pub async fn create_department(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<DepartmentDraft>, JsonRejection>,
) -> CreatedResult<Department> {
    let draft = body(payload)?;
    created(directory::create_department(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/departments/{id}
pub async fn get_department(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<DepartmentId>,
) -> HandlerResult<Department> {
    Ok(Json(directory::get_department(state.repo(), id).await?))
}

/// PUT /api/core/departments/{id}
pub async fn update_department(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DepartmentId>,
    payload: Result<Json<DepartmentDraft>, JsonRejection>,
) -> HandlerResult<Department> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_department(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/departments/{id}
pub async fn delete_department(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DepartmentId>,
) -> Result<StatusCode, AppError> {
    directory::delete_department(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Equipment Categories
// =============================================================================

/// GET /api/core/equipment-categories
pub async fn list_categories(
    State(state): State<AppState>,
    _principal: Principal,
) -> HandlerResult<Vec<CategoryView>> {
    let categories = directory::list_categories(state.repo()).await?;
    Ok(Json(views::category_views(state.repo(), categories).await?))
}

/// POST /api/core/equipment-categories
pub async fn create_category(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<EquipmentCategoryDraft>, JsonRejection>,
) -> CreatedResult<EquipmentCategory> {
    let draft = body(payload)?;
    created(directory::create_category(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/equipment-categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<CategoryId>,
) -> HandlerResult<CategoryView> {
    let category = directory::get_category(state.repo(), id).await?;
    Ok(Json(views::category_view(state.repo(), category).await?))
}

/// PUT /api/core/equipment-categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CategoryId>,
    payload: Result<Json<EquipmentCategoryDraft>, JsonRejection>,
) -> HandlerResult<EquipmentCategory> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_category(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/equipment-categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, AppError> {
    directory::delete_category(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Equipment
// =============================================================================

/// GET /api/core/equipment
pub async fn list_equipment(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<EquipmentView>> {
    let equipment = directory::list_equipment(state.repo(), &principal).await?;
    Ok(Json(views::equipment_views(state.repo(), equipment).await?))
}

/// POST /api/core/equipment
pub async fn create_equipment(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<EquipmentDraft>, JsonRejection>,
) -> CreatedResult<Equipment> {
    let draft = body(payload)?;
    created(directory::create_equipment(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/equipment/{id}
pub async fn get_equipment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<EquipmentId>,
) -> HandlerResult<EquipmentView> {
    let equipment = directory::get_equipment(state.repo(), &principal, id).await?;
    Ok(Json(views::equipment_view(state.repo(), equipment).await?))
}

/// PUT /api/core/equipment/{id}
pub async fn update_equipment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<EquipmentId>,
    payload: Result<Json<EquipmentDraft>, JsonRejection>,
) -> HandlerResult<Equipment> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_equipment(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/equipment/{id}
pub async fn delete_equipment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<EquipmentId>,
) -> Result<StatusCode, AppError> {
    directory::delete_equipment(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Work Centers
// =============================================================================

/// GET /api/core/work-centers
pub async fn list_work_centers(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<WorkCenter>> {
    Ok(Json(directory::list_work_centers(state.repo(), &principal).await?))
}

/// POST /api/core/work-centers
pub async fn create_work_center(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<WorkCenterDraft>, JsonRejection>,
) -> CreatedResult<WorkCenter> {
    let draft = body(payload)?;
    created(directory::create_work_center(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/work-centers/{id}
pub async fn get_work_center(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<WorkCenterId>,
) -> HandlerResult<WorkCenter> {
    Ok(Json(directory::get_work_center(state.repo(), &principal, id).await?))
}

/// PUT /api/core/work-centers/{id}
pub async fn update_work_center(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<WorkCenterId>,
    payload: Result<Json<WorkCenterDraft>, JsonRejection>,
) -> HandlerResult<WorkCenter> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_work_center(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/work-centers/{id}
pub async fn delete_work_center(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<WorkCenterId>,
) -> Result<StatusCode, AppError> {
    directory::delete_work_center(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Teams
// =============================================================================

/// GET /api/core/teams
pub async fn list_teams(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<MaintenanceTeam>> {
    Ok(Json(directory::list_teams(state.repo(), &principal).await?))
}

/// POST /api/core/teams
pub async fn create_team(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<MaintenanceTeamDraft>, JsonRejection>,
) -> CreatedResult<MaintenanceTeam> {
    let draft = body(payload)?;
    created(directory::create_team(state.repo(), &principal, &draft).await?)
}

/// GET /api/core/teams/{id}
pub async fn get_team(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
) -> HandlerResult<MaintenanceTeam> {
    Ok(Json(directory::get_team(state.repo(), &principal, id).await?))
}

/// PUT /api/core/teams/{id}
pub async fn update_team(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
    payload: Result<Json<MaintenanceTeamDraft>, JsonRejection>,
) -> HandlerResult<MaintenanceTeam> {
    let draft = body(payload)?;
    Ok(Json(
        directory::update_team(state.repo(), &principal, id, &draft).await?,
    ))
}

/// DELETE /api/core/teams/{id}
pub async fn delete_team(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<TeamId>,
) -> Result<StatusCode, AppError> {
    directory::delete_team(state.repo(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Select views
// =============================================================================

/// GET /api/core/companies/select
pub async fn company_options(State(state): State<AppState>) -> HandlerResult<Vec<Company>> {
    Ok(Json(directory::company_options(state.repo()).await?))
}

/// GET /api/core/departments/select
pub async fn department_options(
    State(state): State<AppState>,
) -> HandlerResult<Vec<Department>> {
    Ok(Json(directory::department_options(state.repo()).await?))
}

/// GET /api/core/equipment/select
pub async fn equipment_options(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<EquipmentOption>> {
    Ok(Json(directory::equipment_options(state.repo(), &principal).await?))
}

/// GET /api/core/work-centers/select
pub async fn work_center_options(
    State(state): State<AppState>,
    principal: Principal,
) -> HandlerResult<Vec<WorkCenterOption>> {
    Ok(Json(
        directory::work_center_options(state.repo(), &principal).await?,
    ))
}
