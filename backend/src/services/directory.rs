//! Reference data: admin-only writes, role-filtered reads and the compact
//! select views used by client dropdowns.

use super::error::{ServiceError, ServiceResult};
use super::views::{self, EquipmentOption, WorkCenterOption};
use crate::access::{
    can_manage_directory, can_view_equipment, can_view_team, can_view_work_center,
    equipment_in_scope, work_center_in_scope,
};
use crate::api::{
    CategoryId, Company, CompanyDraft, CompanyId, Department, DepartmentDraft, DepartmentId,
    Equipment, EquipmentCategory, EquipmentCategoryDraft, EquipmentDraft, EquipmentId,
    MaintenanceTeam, MaintenanceTeamDraft, Role, TeamId, WorkCenter, WorkCenterDraft,
    WorkCenterId,
};
use crate::auth::Principal;
use crate::db::{AccountRepository, DirectoryRepository, FullRepository};

fn require_admin(principal: &Principal) -> ServiceResult<()> {
    if can_manage_directory(principal) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(
            "Only admins can modify reference data.",
        ))
    }
}

fn checked(result: Result<(), String>) -> ServiceResult<()> {
    result.map_err(ServiceError::Validation)
}

fn hidden(entity: &str, id: impl std::fmt::Display) -> ServiceError {
    ServiceError::not_found(format!("{} {} not found.", entity, id))
}

// =============================================================================
// Companies
// =============================================================================

pub async fn list_companies(repo: &dyn FullRepository) -> ServiceResult<Vec<Company>> {
    Ok(repo.list_companies().await?)
}

pub async fn get_company(repo: &dyn FullRepository, id: CompanyId) -> ServiceResult<Company> {
    Ok(repo.get_company(id).await?)
}

pub async fn create_company(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &CompanyDraft,
) -> ServiceResult<Company> {
    require_admin(principal)?;
    checked(draft.validate())?;
    let company = repo.create_company(draft).await?;
    log::info!("Company {} created by {}", company.id, principal.user_id);
    Ok(company)
}

pub async fn update_company(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: CompanyId,
    draft: &CompanyDraft,
) -> ServiceResult<Company> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.update_company(id, draft).await?)
}

pub async fn delete_company(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: CompanyId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    repo.delete_company(id).await?;
    log::info!("Company {} deleted by {}", id, principal.user_id);
    Ok(())
}

/// Public; used by the registration form.
pub async fn company_options(repo: &dyn FullRepository) -> ServiceResult<Vec<Company>> {
    Ok(repo.list_companies().await?)
}

// =============================================================================
// Departments
// =============================================================================

pub async fn list_departments(repo: &dyn FullRepository) -> ServiceResult<Vec<Department>> {
    Ok(repo.list_departments().await?)
}

pub async fn get_department(
    repo: &dyn FullRepository,
    id: DepartmentId,
) -> ServiceResult<Department> {
    Ok(repo.get_department(id).await?)
}

pub async fn create_department(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &DepartmentDraft,
) -> ServiceResult<Department> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.create_department(draft).await?)
}

pub async fn update_department(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: DepartmentId,
    draft: &DepartmentDraft,
) -> ServiceResult<Department> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.update_department(id, draft).await?)
}

pub async fn delete_department(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: DepartmentId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    Ok(repo.delete_department(id).await?)
}

/// Public; used by the registration form.
pub async fn department_options(repo: &dyn FullRepository) -> ServiceResult<Vec<Department>> {
    Ok(repo.list_departments().await?)
}

// =============================================================================
// Equipment categories
// =============================================================================

async fn check_default_technician(
    repo: &dyn FullRepository,
    draft: &EquipmentCategoryDraft,
) -> ServiceResult<()> {
    if let Some(user) = draft.default_technician {
        let user = repo.get_user(user).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::validation("Invalid default technician.")
            } else {
                e.into()
            }
        })?;
        if user.role != Role::Technician {
            return Err(ServiceError::validation(
                "Default technician must have the technician role.",
            ));
        }
    }
    Ok(())
}

pub async fn list_categories(repo: &dyn FullRepository) -> ServiceResult<Vec<EquipmentCategory>> {
    Ok(repo.list_categories().await?)
}

pub async fn get_category(
    repo: &dyn FullRepository,
    id: CategoryId,
) -> ServiceResult<EquipmentCategory> {
    Ok(repo.get_category(id).await?)
}

pub async fn create_category(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &EquipmentCategoryDraft,
) -> ServiceResult<EquipmentCategory> {
    require_admin(principal)?;
    checked(draft.validate())?;
    check_default_technician(repo, draft).await?;
    Ok(repo.create_category(draft).await?)
}

pub async fn update_category(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: CategoryId,
    draft: &EquipmentCategoryDraft,
) -> ServiceResult<EquipmentCategory> {
    require_admin(principal)?;
    checked(draft.validate())?;
    check_default_technician(repo, draft).await?;
    Ok(repo.update_category(id, draft).await?)
}

pub async fn delete_category(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: CategoryId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    Ok(repo.delete_category(id).await?)
}

// =============================================================================
// Equipment
// =============================================================================

pub async fn list_equipment(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<Equipment>> {
    Ok(repo
        .list_equipment()
        .await?
        .into_iter()
        .filter(|e| can_view_equipment(principal, e))
        .collect())
}

pub async fn get_equipment(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: EquipmentId,
) -> ServiceResult<Equipment> {
    let equipment = repo.get_equipment(id).await?;
    if can_view_equipment(principal, &equipment) {
        Ok(equipment)
    } else {
        Err(hidden("Equipment", id))
    }
}

pub async fn create_equipment(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &EquipmentDraft,
) -> ServiceResult<Equipment> {
    require_admin(principal)?;
    checked(draft.validate())?;
    let equipment = repo.create_equipment(draft).await?;
    log::info!("Equipment {} ({}) registered", equipment.id, equipment.serial_number);
    Ok(equipment)
}

pub async fn update_equipment(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: EquipmentId,
    draft: &EquipmentDraft,
) -> ServiceResult<Equipment> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.update_equipment(id, draft).await?)
}

pub async fn delete_equipment(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: EquipmentId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    Ok(repo.delete_equipment(id).await?)
}

/// Owned or department equipment, for every role.
pub async fn equipment_options(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<EquipmentOption>> {
    let scoped = repo
        .list_equipment()
        .await?
        .into_iter()
        .filter(|e| equipment_in_scope(principal, e))
        .collect();
    views::equipment_options(repo, scoped).await
}

// =============================================================================
// Work centers
// =============================================================================

pub async fn list_work_centers(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<WorkCenter>> {
    Ok(repo
        .list_work_centers()
        .await?
        .into_iter()
        .filter(|c| can_view_work_center(principal, c))
        .collect())
}

pub async fn get_work_center(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: WorkCenterId,
) -> ServiceResult<WorkCenter> {
    let center = repo.get_work_center(id).await?;
    if can_view_work_center(principal, &center) {
        Ok(center)
    } else {
        Err(hidden("Work center", id))
    }
}

pub async fn create_work_center(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &WorkCenterDraft,
) -> ServiceResult<WorkCenter> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.create_work_center(draft).await?)
}

pub async fn update_work_center(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: WorkCenterId,
    draft: &WorkCenterDraft,
) -> ServiceResult<WorkCenter> {
    require_admin(principal)?;
    checked(draft.validate())?;
    Ok(repo.update_work_center(id, draft).await?)
}

pub async fn delete_work_center(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: WorkCenterId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    Ok(repo.delete_work_center(id).await?)
}

/// Company work centers, for every role.
pub async fn work_center_options(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<WorkCenterOption>> {
    let scoped = repo
        .list_work_centers()
        .await?
        .into_iter()
        .filter(|c| work_center_in_scope(principal, c))
        .collect();
    views::work_center_options(repo, scoped).await
}

// =============================================================================
// Teams
// =============================================================================

/// Every member must exist and hold the technician role.
async fn check_members(repo: &dyn FullRepository, draft: &MaintenanceTeamDraft) -> ServiceResult<()> {
    for member in draft.unique_members() {
        let user = repo.get_user(member).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::validation(format!("User {} does not exist.", member))
            } else {
                e.into()
            }
        })?;
        if user.role != Role::Technician {
            return Err(ServiceError::validation(format!(
                "User {} is not a technician.",
                member
            )));
        }
    }
    Ok(())
}

pub async fn list_teams(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<MaintenanceTeam>> {
    Ok(repo
        .list_teams()
        .await?
        .into_iter()
        .filter(|t| can_view_team(principal, t))
        .collect())
}

pub async fn get_team(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: TeamId,
) -> ServiceResult<MaintenanceTeam> {
    let team = repo.get_team(id).await?;
    if can_view_team(principal, &team) {
        Ok(team)
    } else {
        Err(hidden("Team", id))
    }
}

pub async fn create_team(
    repo: &dyn FullRepository,
    principal: &Principal,
    draft: &MaintenanceTeamDraft,
) -> ServiceResult<MaintenanceTeam> {
    require_admin(principal)?;
    checked(draft.validate())?;
    check_members(repo, draft).await?;
    let team = repo.create_team(draft).await?;
    log::info!("Team {} created with {} members", team.id, team.members.len());
    Ok(team)
}

pub async fn update_team(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: TeamId,
    draft: &MaintenanceTeamDraft,
) -> ServiceResult<MaintenanceTeam> {
    require_admin(principal)?;
    checked(draft.validate())?;
    check_members(repo, draft).await?;
    Ok(repo.update_team(id, draft).await?)
}

pub async fn delete_team(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: TeamId,
) -> ServiceResult<()> {
    require_admin(principal)?;
    Ok(repo.delete_team(id).await?)
}
