//! Read-side shapes.
//!
//! Writes accept and return the stored rows; list and retrieve endpoints
//! answer with these views, which resolve referenced ids into the names and
//! emails clients display.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::error::ServiceResult;
use super::maintenance::{Availability, Reassignment};
use crate::api::{
    CategoryId, Company, CompanyId, Department, DepartmentId, Equipment, EquipmentCategory,
    EquipmentId, MaintenanceRequest, Role, TeamId, User, UserId, WorkCenter, WorkCenterId, WorkLog,
};
use crate::db::{AccountRepository, DirectoryRepository, FullRepository, RepositoryResult};

// =============================================================================
// Nested references
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRef {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRef {
    pub id: CompanyId,
    pub name: String,
    pub location: String,
}

impl From<&Company> for CompanyRef {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            location: company.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkCenterRef {
    pub id: WorkCenterId,
    pub name: String,
    pub code: String,
}

// =============================================================================
// Views
// =============================================================================

/// A request with the display names of everything it points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: MaintenanceRequest,
    pub equipment_name: String,
    pub work_center_name: String,
    pub team_name: Option<String>,
    pub technician_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkLogView {
    #[serde(flatten)]
    pub log: WorkLog,
    pub technician_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentView {
    pub id: EquipmentId,
    pub name: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiration: Option<NaiveDate>,
    pub last_maintenance_service_date: Option<NaiveDate>,
    pub maintenance_interval_days: Option<u32>,
    pub company: CompanyRef,
    pub category: CategoryRef,
    pub employee: Option<UserRef>,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: EquipmentCategory,
    pub default_technician_detail: Option<UserRef>,
}

/// Entry of `GET /api/core/equipment/select`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentOption {
    pub id: EquipmentId,
    pub name: String,
    pub serial_number: String,
    pub company: CompanyRef,
    pub category: CategoryRef,
}

/// Entry of `GET /api/core/work-centers/select`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkCenterOption {
    pub id: WorkCenterId,
    pub name: String,
    pub code: String,
    pub company_id: CompanyId,
    pub company_name: String,
    pub company_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityView {
    pub assigned_technician: UserRef,
    pub available_work_centers: Vec<WorkCenterRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReassignmentView {
    pub message: String,
    #[serde(flatten)]
    pub reassignment: Reassignment,
    pub new_technician_email: String,
    pub new_team_name: String,
}

// =============================================================================
// Lookups
// =============================================================================

/// Users missing from storage render as absent details, not errors.
async fn find_user(repo: &dyn FullRepository, id: UserId) -> ServiceResult<Option<User>> {
    optional(repo.get_user(id).await)
}

fn optional<T>(result: RepositoryResult<T>) -> ServiceResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn users_by_id(
    repo: &dyn FullRepository,
    ids: impl IntoIterator<Item = UserId>,
) -> ServiceResult<HashMap<UserId, User>> {
    let mut users = HashMap::new();
    for id in ids.into_iter().collect::<HashSet<_>>() {
        if let Some(user) = find_user(repo, id).await? {
            users.insert(id, user);
        }
    }
    Ok(users)
}

/// Names and emails referenced by a batch of requests, loaded once.
struct RequestLookup {
    equipment: HashMap<EquipmentId, String>,
    work_centers: HashMap<WorkCenterId, String>,
    teams: HashMap<TeamId, String>,
    users: HashMap<UserId, User>,
}

impl RequestLookup {
    async fn load(repo: &dyn FullRepository, requests: &[MaintenanceRequest]) -> ServiceResult<Self> {
        let equipment = repo
            .list_equipment()
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();
        let work_centers = repo
            .list_work_centers()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let teams = repo
            .list_teams()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        let users = users_by_id(repo, requests.iter().filter_map(|r| r.assigned_technician)).await?;
        Ok(Self {
            equipment,
            work_centers,
            teams,
            users,
        })
    }

    fn view(&self, request: MaintenanceRequest) -> RequestView {
        RequestView {
            equipment_name: self.equipment.get(&request.equipment).cloned().unwrap_or_default(),
            work_center_name: self
                .work_centers
                .get(&request.work_center)
                .cloned()
                .unwrap_or_default(),
            team_name: request.assigned_team.and_then(|t| self.teams.get(&t).cloned()),
            technician_email: request
                .assigned_technician
                .and_then(|u| self.users.get(&u).map(|user| user.email.clone())),
            request,
        }
    }
}

/// Company and category tables shared by the equipment views.
struct EquipmentLookup {
    companies: HashMap<CompanyId, Company>,
    categories: HashMap<CategoryId, String>,
}

impl EquipmentLookup {
    async fn load(repo: &dyn FullRepository) -> ServiceResult<Self> {
        let companies = repo
            .list_companies()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let categories = repo
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        Ok(Self {
            companies,
            categories,
        })
    }

    fn company(&self, id: CompanyId) -> CompanyRef {
        match self.companies.get(&id) {
            Some(company) => company.into(),
            None => CompanyRef {
                id,
                name: String::new(),
                location: String::new(),
            },
        }
    }

    fn category(&self, id: CategoryId) -> CategoryRef {
        CategoryRef {
            id,
            name: self.categories.get(&id).cloned().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Builders
// =============================================================================

pub async fn request_views(
    repo: &dyn FullRepository,
    requests: Vec<MaintenanceRequest>,
) -> ServiceResult<Vec<RequestView>> {
    let lookup = RequestLookup::load(repo, &requests).await?;
    Ok(requests.into_iter().map(|r| lookup.view(r)).collect())
}

pub async fn request_view(
    repo: &dyn FullRepository,
    request: MaintenanceRequest,
) -> ServiceResult<RequestView> {
    let equipment_name = optional(repo.get_equipment(request.equipment).await)?
        .map(|e| e.name)
        .unwrap_or_default();
    let work_center_name = optional(repo.get_work_center(request.work_center).await)?
        .map(|c| c.name)
        .unwrap_or_default();
    let team_name = match request.assigned_team {
        Some(team) => optional(repo.get_team(team).await)?.map(|t| t.name),
        None => None,
    };
    let technician_email = match request.assigned_technician {
        Some(user) => find_user(repo, user).await?.map(|u| u.email),
        None => None,
    };
    Ok(RequestView {
        request,
        equipment_name,
        work_center_name,
        team_name,
        technician_email,
    })
}

pub async fn work_log_views(
    repo: &dyn FullRepository,
    logs: Vec<WorkLog>,
) -> ServiceResult<Vec<WorkLogView>> {
    let users = users_by_id(repo, logs.iter().map(|l| l.technician)).await?;
    Ok(logs
        .into_iter()
        .map(|log| WorkLogView {
            technician_email: users
                .get(&log.technician)
                .map(|u| u.email.clone())
                .unwrap_or_default(),
            log,
        })
        .collect())
}

async fn equipment_view_with(
    repo: &dyn FullRepository,
    lookup: &EquipmentLookup,
    departments: &HashMap<DepartmentId, Department>,
    equipment: Equipment,
) -> ServiceResult<EquipmentView> {
    let employee = match equipment.employee {
        Some(user) => find_user(repo, user).await?.as_ref().map(UserRef::from),
        None => None,
    };
    Ok(EquipmentView {
        id: equipment.id,
        company: lookup.company(equipment.company),
        category: lookup.category(equipment.category),
        employee,
        department: equipment.department.and_then(|d| departments.get(&d).cloned()),
        name: equipment.name,
        serial_number: equipment.serial_number,
        purchase_date: equipment.purchase_date,
        warranty_expiration: equipment.warranty_expiration,
        last_maintenance_service_date: equipment.last_maintenance_service_date,
        maintenance_interval_days: equipment.maintenance_interval_days,
    })
}

pub async fn equipment_views(
    repo: &dyn FullRepository,
    equipment: Vec<Equipment>,
) -> ServiceResult<Vec<EquipmentView>> {
    let lookup = EquipmentLookup::load(repo).await?;
    let departments: HashMap<_, _> = repo
        .list_departments()
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();
    let mut views = Vec::with_capacity(equipment.len());
    for item in equipment {
        views.push(equipment_view_with(repo, &lookup, &departments, item).await?);
    }
    Ok(views)
}

pub async fn equipment_view(
    repo: &dyn FullRepository,
    equipment: Equipment,
) -> ServiceResult<EquipmentView> {
    let mut views = equipment_views(repo, vec![equipment]).await?;
    Ok(views.remove(0))
}

pub async fn category_views(
    repo: &dyn FullRepository,
    categories: Vec<EquipmentCategory>,
) -> ServiceResult<Vec<CategoryView>> {
    let users = users_by_id(repo, categories.iter().filter_map(|c| c.default_technician)).await?;
    Ok(categories
        .into_iter()
        .map(|category| CategoryView {
            default_technician_detail: category
                .default_technician
                .and_then(|u| users.get(&u))
                .map(UserRef::from),
            category,
        })
        .collect())
}

pub async fn category_view(
    repo: &dyn FullRepository,
    category: EquipmentCategory,
) -> ServiceResult<CategoryView> {
    let mut views = category_views(repo, vec![category]).await?;
    Ok(views.remove(0))
}

pub async fn equipment_options(
    repo: &dyn FullRepository,
    equipment: Vec<Equipment>,
) -> ServiceResult<Vec<EquipmentOption>> {
    let lookup = EquipmentLookup::load(repo).await?;
    Ok(equipment
        .into_iter()
        .map(|e| EquipmentOption {
            id: e.id,
            company: lookup.company(e.company),
            category: lookup.category(e.category),
            name: e.name,
            serial_number: e.serial_number,
        })
        .collect())
}

pub async fn work_center_options(
    repo: &dyn FullRepository,
    centers: Vec<WorkCenter>,
) -> ServiceResult<Vec<WorkCenterOption>> {
    let lookup = EquipmentLookup::load(repo).await?;
    Ok(centers
        .into_iter()
        .map(|c| {
            let company = lookup.company(c.company);
            WorkCenterOption {
                id: c.id,
                name: c.name,
                code: c.code,
                company_id: company.id,
                company_name: company.name,
                company_location: company.location,
            }
        })
        .collect())
}

pub async fn availability_view(
    repo: &dyn FullRepository,
    availability: Availability,
) -> ServiceResult<AvailabilityView> {
    let technician = repo.get_user(availability.assigned_technician).await?;
    Ok(AvailabilityView {
        assigned_technician: UserRef::from(&technician),
        available_work_centers: availability
            .available_work_centers
            .into_iter()
            .map(|c| WorkCenterRef {
                id: c.id,
                name: c.name,
                code: c.code,
            })
            .collect(),
    })
}

pub async fn reassignment_view(
    repo: &dyn FullRepository,
    reassignment: Reassignment,
) -> ServiceResult<ReassignmentView> {
    let technician = repo.get_user(reassignment.new_technician).await?;
    let team = repo.get_team(reassignment.new_team).await?;
    Ok(ReassignmentView {
        message: "Maintenance reassigned successfully.".to_string(),
        reassignment,
        new_technician_email: technician.email,
        new_team_name: team.name,
    })
}
