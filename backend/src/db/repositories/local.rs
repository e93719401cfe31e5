//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All tables live in
//! ordered maps behind a single lock, which keeps results deterministic and
//! makes every multi-row write atomic.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::*;
use crate::db::repository::*;

/// In-memory local repository.
///
/// # Example
/// ```ignore
/// use gearguard::db::repositories::LocalRepository;
///
/// #[tokio::test]
/// async fn test_company_storage() {
///     let repo = LocalRepository::new();
///     let draft = CompanyDraft { name: "Acme".to_string(), location: String::new() };
///     let company = repo.create_company(&draft).await.unwrap();
///     assert_eq!(company.id.value(), 1);
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    users: BTreeMap<UserId, User>,
    companies: BTreeMap<CompanyId, Company>,
    departments: BTreeMap<DepartmentId, Department>,
    categories: BTreeMap<CategoryId, EquipmentCategory>,
    equipment: BTreeMap<EquipmentId, Equipment>,
    work_centers: BTreeMap<WorkCenterId, WorkCenter>,
    teams: BTreeMap<TeamId, MaintenanceTeam>,
    requests: BTreeMap<RequestId, MaintenanceRequest>,
    assignments: BTreeMap<AssignmentId, MaintenanceAssignment>,
    work_logs: BTreeMap<WorkLogId, WorkLog>,

    // ID counters, one sequence per table
    counters: Counters,

    // Connection health
    is_healthy: bool,
}

#[derive(Default)]
struct Counters {
    user: i64,
    company: i64,
    department: i64,
    category: i64,
    equipment: i64,
    work_center: i64,
    team: i64,
    request: i64,
    assignment: i64,
    work_log: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            companies: BTreeMap::new(),
            departments: BTreeMap::new(),
            categories: BTreeMap::new(),
            equipment: BTreeMap::new(),
            work_centers: BTreeMap::new(),
            teams: BTreeMap::new(),
            requests: BTreeMap::new(),
            assignments: BTreeMap::new(),
            work_logs: BTreeMap::new(),
            counters: Counters::default(),
            is_healthy: true,
        }
    }
}

fn blocked(operation: &str, entity: &str, id: impl ToString, by: &str) -> RepositoryError {
    RepositoryError::validation_with_context(
        format!("Cannot delete {} while {} still reference it", entity, by),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

fn dangling(operation: &str, entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::validation_with_context(
        format!("Referenced {} {} does not exist", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

fn duplicate(operation: &str, entity: &str, field: &str, value: &str) -> RepositoryError {
    RepositoryError::validation_with_context(
        format!("{} with this {} already exists", entity, field),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_details(format!("{}={}", field, value)),
    )
}

impl LocalData {
    // ==================== Reference checks ====================

    fn require_user(&self, op: &str, id: UserId) -> RepositoryResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(dangling(op, "user", id))
        }
    }

    fn require_company(&self, op: &str, id: CompanyId) -> RepositoryResult<()> {
        if self.companies.contains_key(&id) {
            Ok(())
        } else {
            Err(dangling(op, "company", id))
        }
    }

    fn require_department(&self, op: &str, id: Option<DepartmentId>) -> RepositoryResult<()> {
        match id {
            Some(id) if !self.departments.contains_key(&id) => Err(dangling(op, "department", id)),
            _ => Ok(()),
        }
    }

    fn check_equipment_refs(&self, op: &str, draft: &EquipmentDraft) -> RepositoryResult<()> {
        self.require_company(op, draft.company)?;
        if !self.categories.contains_key(&draft.category) {
            return Err(dangling(op, "equipment_category", draft.category));
        }
        self.require_department(op, draft.department)?;
        if let Some(employee) = draft.employee {
            self.require_user(op, employee)?;
        }
        Ok(())
    }

    fn check_team_refs(&self, op: &str, draft: &MaintenanceTeamDraft) -> RepositoryResult<()> {
        self.require_company(op, draft.company)?;
        for member in &draft.members {
            self.require_user(op, *member)?;
        }
        Ok(())
    }

    fn check_alternates(
        &self,
        op: &str,
        owner: Option<WorkCenterId>,
        alternates: &[WorkCenterId],
    ) -> RepositoryResult<()> {
        for alt in alternates {
            if Some(*alt) == owner {
                return Err(RepositoryError::validation_with_context(
                    "A work center cannot be its own alternate",
                    ErrorContext::new(op)
                        .with_entity("work_center")
                        .with_entity_id(alt),
                ));
            }
            if !self.work_centers.contains_key(alt) {
                return Err(dangling(op, "work_center", alt));
            }
        }
        Ok(())
    }

    // ==================== Work center alternates ====================

    fn link_alternate(&mut self, from: WorkCenterId, to: WorkCenterId) {
        if let Some(center) = self.work_centers.get_mut(&from) {
            if !center.alternative_work_centers.contains(&to) {
                center.alternative_work_centers.push(to);
            }
        }
    }

    fn unlink_alternate(&mut self, from: WorkCenterId, to: WorkCenterId) {
        if let Some(center) = self.work_centers.get_mut(&from) {
            center.alternative_work_centers.retain(|id| *id != to);
        }
    }

    fn deactivate_assignments(&mut self, request: RequestId) {
        for assignment in self.assignments.values_mut() {
            if assignment.maintenance_request == request {
                assignment.is_active = false;
            }
        }
    }

    fn insert_assignment(&mut self, new: &NewAssignment) -> MaintenanceAssignment {
        let id = AssignmentId::new(next(&mut self.counters.assignment));
        let assignment = MaintenanceAssignment {
            id,
            maintenance_request: new.maintenance_request,
            assigned_team: new.assigned_team,
            assigned_technician: Some(new.assigned_technician),
            assigned_by: Some(new.assigned_by),
            assigned_at: new.assigned_at,
            is_active: true,
        };
        self.assignments.insert(id, assignment.clone());
        assignment
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of stored requests.
    pub fn request_count(&self) -> usize {
        self.data.read().requests.len()
    }

    /// Number of active assignment rows for a request.
    pub fn active_assignment_count(&self, request: RequestId) -> usize {
        self.data
            .read()
            .assignments
            .values()
            .filter(|a| a.maintenance_request == request && a.is_active)
            .count()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, LocalData>> {
        let data = self.data.read();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(data)
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, LocalData>> {
        let data = self.data.write();
        if !data.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(data)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let op = "create_user";
        let mut data = self.write()?;
        if data
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(duplicate(op, "user", "email", &user.email));
        }
        if let Some(company) = user.company {
            data.require_company(op, company)?;
        }
        data.require_department(op, user.department)?;

        let id = UserId::new(next(&mut data.counters.user));
        let stored = User {
            id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            company: user.company,
            department: user.department,
        };
        data.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_user", "user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

// =============================================================================
// Directory
// =============================================================================

#[async_trait]
impl DirectoryRepository for LocalRepository {
    // ==================== Companies ====================

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        Ok(self.read()?.companies.values().cloned().collect())
    }

    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company> {
        self.read()?
            .companies
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_company", "company", id))
    }

    async fn create_company(&self, draft: &CompanyDraft) -> RepositoryResult<Company> {
        let mut data = self.write()?;
        if data.companies.values().any(|c| c.name == draft.name) {
            return Err(duplicate("create_company", "company", "name", &draft.name));
        }
        let id = CompanyId::new(next(&mut data.counters.company));
        let company = Company {
            id,
            name: draft.name.clone(),
            location: draft.location.clone(),
            created_at: Utc::now(),
        };
        data.companies.insert(id, company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> RepositoryResult<Company> {
        let op = "update_company";
        let mut data = self.write()?;
        if data
            .companies
            .values()
            .any(|c| c.id != id && c.name == draft.name)
        {
            return Err(duplicate(op, "company", "name", &draft.name));
        }
        let company = data
            .companies
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing(op, "company", id))?;
        company.name = draft.name.clone();
        company.location = draft.location.clone();
        Ok(company.clone())
    }

    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()> {
        let op = "delete_company";
        let mut data = self.write()?;
        if !data.companies.contains_key(&id) {
            return Err(RepositoryError::missing(op, "company", id));
        }
        let referenced = data.users.values().any(|u| u.company == Some(id))
            || data.equipment.values().any(|e| e.company == id)
            || data.work_centers.values().any(|w| w.company == id)
            || data.teams.values().any(|t| t.company == id)
            || data.requests.values().any(|r| r.company == id);
        if referenced {
            return Err(blocked(op, "company", id, "other records"));
        }
        data.companies.remove(&id);
        Ok(())
    }

    // ==================== Departments ====================

    async fn list_departments(&self) -> RepositoryResult<Vec<Department>> {
        Ok(self.read()?.departments.values().cloned().collect())
    }

    async fn get_department(&self, id: DepartmentId) -> RepositoryResult<Department> {
        self.read()?
            .departments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_department", "department", id))
    }

    async fn create_department(&self, draft: &DepartmentDraft) -> RepositoryResult<Department> {
        let mut data = self.write()?;
        let id = DepartmentId::new(next(&mut data.counters.department));
        let department = Department {
            id,
            name: draft.name.clone(),
        };
        data.departments.insert(id, department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        id: DepartmentId,
        draft: &DepartmentDraft,
    ) -> RepositoryResult<Department> {
        let mut data = self.write()?;
        let department = data
            .departments
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing("update_department", "department", id))?;
        department.name = draft.name.clone();
        Ok(department.clone())
    }

    async fn delete_department(&self, id: DepartmentId) -> RepositoryResult<()> {
        let op = "delete_department";
        let mut data = self.write()?;
        if !data.departments.contains_key(&id) {
            return Err(RepositoryError::missing(op, "department", id));
        }
        let referenced = data.users.values().any(|u| u.department == Some(id))
            || data.equipment.values().any(|e| e.department == Some(id))
            || data.requests.values().any(|r| r.department == Some(id));
        if referenced {
            return Err(blocked(op, "department", id, "other records"));
        }
        data.departments.remove(&id);
        Ok(())
    }

    // ==================== Equipment categories ====================

    async fn list_categories(&self) -> RepositoryResult<Vec<EquipmentCategory>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<EquipmentCategory> {
        self.read()?
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_category", "equipment_category", id))
    }

    async fn create_category(
        &self,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory> {
        let mut data = self.write()?;
        if let Some(technician) = draft.default_technician {
            data.require_user("create_category", technician)?;
        }
        let id = CategoryId::new(next(&mut data.counters.category));
        let category = EquipmentCategory {
            id,
            name: draft.name.clone(),
            default_technician: draft.default_technician,
        };
        data.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory> {
        let op = "update_category";
        let mut data = self.write()?;
        if let Some(technician) = draft.default_technician {
            data.require_user(op, technician)?;
        }
        let category = data
            .categories
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing(op, "equipment_category", id))?;
        category.name = draft.name.clone();
        category.default_technician = draft.default_technician;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()> {
        let op = "delete_category";
        let mut data = self.write()?;
        if !data.categories.contains_key(&id) {
            return Err(RepositoryError::missing(op, "equipment_category", id));
        }
        if data.equipment.values().any(|e| e.category == id) {
            return Err(blocked(op, "equipment_category", id, "equipment"));
        }
        data.categories.remove(&id);
        Ok(())
    }

    // ==================== Equipment ====================

    async fn list_equipment(&self) -> RepositoryResult<Vec<Equipment>> {
        Ok(self.read()?.equipment.values().cloned().collect())
    }

    async fn get_equipment(&self, id: EquipmentId) -> RepositoryResult<Equipment> {
        self.read()?
            .equipment
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_equipment", "equipment", id))
    }

    async fn create_equipment(&self, draft: &EquipmentDraft) -> RepositoryResult<Equipment> {
        let op = "create_equipment";
        let mut data = self.write()?;
        if data
            .equipment
            .values()
            .any(|e| e.serial_number == draft.serial_number)
        {
            return Err(duplicate(op, "equipment", "serial_number", &draft.serial_number));
        }
        data.check_equipment_refs(op, draft)?;

        let id = EquipmentId::new(next(&mut data.counters.equipment));
        let equipment = equipment_from_draft(id, draft);
        data.equipment.insert(id, equipment.clone());
        Ok(equipment)
    }

    async fn update_equipment(
        &self,
        id: EquipmentId,
        draft: &EquipmentDraft,
    ) -> RepositoryResult<Equipment> {
        let op = "update_equipment";
        let mut data = self.write()?;
        if !data.equipment.contains_key(&id) {
            return Err(RepositoryError::missing(op, "equipment", id));
        }
        if data
            .equipment
            .values()
            .any(|e| e.id != id && e.serial_number == draft.serial_number)
        {
            return Err(duplicate(op, "equipment", "serial_number", &draft.serial_number));
        }
        data.check_equipment_refs(op, draft)?;

        let equipment = equipment_from_draft(id, draft);
        data.equipment.insert(id, equipment.clone());
        Ok(equipment)
    }

    async fn delete_equipment(&self, id: EquipmentId) -> RepositoryResult<()> {
        let op = "delete_equipment";
        let mut data = self.write()?;
        if !data.equipment.contains_key(&id) {
            return Err(RepositoryError::missing(op, "equipment", id));
        }
        if data.requests.values().any(|r| r.equipment == id) {
            return Err(blocked(op, "equipment", id, "maintenance requests"));
        }
        data.equipment.remove(&id);
        Ok(())
    }

    // ==================== Work centers ====================

    async fn list_work_centers(&self) -> RepositoryResult<Vec<WorkCenter>> {
        Ok(self.read()?.work_centers.values().cloned().collect())
    }

    async fn get_work_center(&self, id: WorkCenterId) -> RepositoryResult<WorkCenter> {
        self.read()?
            .work_centers
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_work_center", "work_center", id))
    }

    async fn create_work_center(&self, draft: &WorkCenterDraft) -> RepositoryResult<WorkCenter> {
        let op = "create_work_center";
        let mut data = self.write()?;
        if data.work_centers.values().any(|w| w.code == draft.code) {
            return Err(duplicate(op, "work_center", "code", &draft.code));
        }
        data.require_company(op, draft.company)?;
        let alternates = draft.unique_alternates();
        data.check_alternates(op, None, &alternates)?;

        let id = WorkCenterId::new(next(&mut data.counters.work_center));
        let center = work_center_from_draft(id, draft, alternates.clone());
        data.work_centers.insert(id, center.clone());
        for alt in alternates {
            data.link_alternate(alt, id);
        }
        Ok(center)
    }

    async fn update_work_center(
        &self,
        id: WorkCenterId,
        draft: &WorkCenterDraft,
    ) -> RepositoryResult<WorkCenter> {
        let op = "update_work_center";
        let mut data = self.write()?;
        let previous = data
            .work_centers
            .get(&id)
            .map(|w| w.alternative_work_centers.clone())
            .ok_or_else(|| RepositoryError::missing(op, "work_center", id))?;
        if data
            .work_centers
            .values()
            .any(|w| w.id != id && w.code == draft.code)
        {
            return Err(duplicate(op, "work_center", "code", &draft.code));
        }
        data.require_company(op, draft.company)?;
        let alternates = draft.unique_alternates();
        data.check_alternates(op, Some(id), &alternates)?;

        for old in previous.iter().filter(|old| !alternates.contains(*old)) {
            data.unlink_alternate(*old, id);
        }
        for alt in &alternates {
            data.link_alternate(*alt, id);
        }
        let center = work_center_from_draft(id, draft, alternates);
        data.work_centers.insert(id, center.clone());
        Ok(center)
    }

    async fn delete_work_center(&self, id: WorkCenterId) -> RepositoryResult<()> {
        let op = "delete_work_center";
        let mut data = self.write()?;
        if !data.work_centers.contains_key(&id) {
            return Err(RepositoryError::missing(op, "work_center", id));
        }
        if data.requests.values().any(|r| r.work_center == id) {
            return Err(blocked(op, "work_center", id, "maintenance requests"));
        }
        data.work_centers.remove(&id);
        for center in data.work_centers.values_mut() {
            center.alternative_work_centers.retain(|alt| *alt != id);
        }
        Ok(())
    }

    // ==================== Maintenance teams ====================

    async fn list_teams(&self) -> RepositoryResult<Vec<MaintenanceTeam>> {
        Ok(self.read()?.teams.values().cloned().collect())
    }

    async fn get_team(&self, id: TeamId) -> RepositoryResult<MaintenanceTeam> {
        self.read()?
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_team", "team", id))
    }

    async fn create_team(&self, draft: &MaintenanceTeamDraft) -> RepositoryResult<MaintenanceTeam> {
        let op = "create_team";
        let mut data = self.write()?;
        data.check_team_refs(op, draft)?;
        let id = TeamId::new(next(&mut data.counters.team));
        let team = MaintenanceTeam {
            id,
            name: draft.name.clone(),
            company: draft.company,
            members: draft.unique_members(),
        };
        data.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn update_team(
        &self,
        id: TeamId,
        draft: &MaintenanceTeamDraft,
    ) -> RepositoryResult<MaintenanceTeam> {
        let op = "update_team";
        let mut data = self.write()?;
        if !data.teams.contains_key(&id) {
            return Err(RepositoryError::missing(op, "team", id));
        }
        data.check_team_refs(op, draft)?;
        let team = MaintenanceTeam {
            id,
            name: draft.name.clone(),
            company: draft.company,
            members: draft.unique_members(),
        };
        data.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn delete_team(&self, id: TeamId) -> RepositoryResult<()> {
        let op = "delete_team";
        let mut data = self.write()?;
        if !data.teams.contains_key(&id) {
            return Err(RepositoryError::missing(op, "team", id));
        }
        let referenced = data.requests.values().any(|r| r.assigned_team == Some(id))
            || data
                .assignments
                .values()
                .any(|a| a.assigned_team == Some(id));
        if referenced {
            return Err(blocked(op, "team", id, "maintenance requests"));
        }
        data.teams.remove(&id);
        Ok(())
    }
}

fn equipment_from_draft(id: EquipmentId, draft: &EquipmentDraft) -> Equipment {
    Equipment {
        id,
        name: draft.name.clone(),
        serial_number: draft.serial_number.clone(),
        purchase_date: draft.purchase_date,
        warranty_expiration: draft.warranty_expiration,
        last_maintenance_service_date: draft.last_maintenance_service_date,
        maintenance_interval_days: draft.maintenance_interval_days,
        company: draft.company,
        category: draft.category,
        employee: draft.employee,
        department: draft.department,
    }
}

fn work_center_from_draft(
    id: WorkCenterId,
    draft: &WorkCenterDraft,
    alternates: Vec<WorkCenterId>,
) -> WorkCenter {
    WorkCenter {
        id,
        name: draft.name.clone(),
        code: draft.code.clone(),
        company: draft.company,
        tag: draft.tag.clone(),
        alternative_work_centers: alternates,
        cost_per_hour: draft.cost_per_hour,
        capacity: draft.capacity,
        time_efficiency: draft.time_efficiency,
        oee_target: draft.oee_target,
    }
}

// =============================================================================
// Maintenance
// =============================================================================

#[async_trait]
impl MaintenanceRepository for LocalRepository {
    async fn create_request(
        &self,
        request: &NewMaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest> {
        let op = "create_request";
        let mut data = self.write()?;
        if !data.equipment.contains_key(&request.equipment) {
            return Err(dangling(op, "equipment", request.equipment));
        }
        if !data.work_centers.contains_key(&request.work_center) {
            return Err(dangling(op, "work_center", request.work_center));
        }
        if let Some(team) = request.assigned_team {
            if !data.teams.contains_key(&team) {
                return Err(dangling(op, "team", team));
            }
        }
        data.require_company(op, request.company)?;
        data.require_department(op, request.department)?;
        data.require_user(op, request.created_by)?;
        data.require_user(op, request.assigned_technician)?;

        let id = RequestId::new(next(&mut data.counters.request));
        let stored = MaintenanceRequest {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            maintenance_type: request.maintenance_type,
            priority: request.priority,
            status: request.status,
            equipment: request.equipment,
            work_center: request.work_center,
            company: request.company,
            department: request.department,
            created_by: request.created_by,
            assigned_team: request.assigned_team,
            assigned_technician: Some(request.assigned_technician),
            scheduled_start: Some(request.scheduled_start),
            duration_hours: Some(request.duration_hours),
            created_at: request.created_at,
            updated_at: request.created_at,
        };
        data.requests.insert(id, stored.clone());
        data.insert_assignment(&NewAssignment {
            maintenance_request: id,
            assigned_team: request.assigned_team,
            assigned_technician: request.assigned_technician,
            assigned_by: request.created_by,
            assigned_at: request.created_at,
        });
        Ok(stored)
    }

    async fn get_request(&self, id: RequestId) -> RepositoryResult<MaintenanceRequest> {
        self.read()?
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_request", "maintenance_request", id))
    }

    async fn list_requests(&self) -> RepositoryResult<Vec<MaintenanceRequest>> {
        let mut requests: Vec<MaintenanceRequest> =
            self.read()?.requests.values().cloned().collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn update_request(
        &self,
        request: &MaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest> {
        let op = "update_request";
        let mut data = self.write()?;
        if !data.requests.contains_key(&request.id) {
            return Err(RepositoryError::missing(op, "maintenance_request", request.id));
        }
        if !data.equipment.contains_key(&request.equipment) {
            return Err(dangling(op, "equipment", request.equipment));
        }
        if !data.work_centers.contains_key(&request.work_center) {
            return Err(dangling(op, "work_center", request.work_center));
        }
        let mut stored = request.clone();
        stored.updated_at = Utc::now();
        data.requests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_booked_in_window(
        &self,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<MaintenanceRequest>> {
        Ok(self
            .read()?
            .requests
            .values()
            .filter(|r| r.starts_in(window))
            .cloned()
            .collect())
    }

    async fn record_reassignment(
        &self,
        request: &MaintenanceRequest,
        assignment: &NewAssignment,
    ) -> RepositoryResult<MaintenanceAssignment> {
        let op = "record_reassignment";
        let mut data = self.write()?;
        if !data.requests.contains_key(&request.id) {
            return Err(RepositoryError::missing(op, "maintenance_request", request.id));
        }
        if let Some(team) = assignment.assigned_team {
            if !data.teams.contains_key(&team) {
                return Err(dangling(op, "team", team));
            }
        }
        data.require_user(op, assignment.assigned_technician)?;

        data.deactivate_assignments(request.id);
        let opened = data.insert_assignment(assignment);
        let mut stored = request.clone();
        stored.updated_at = assignment.assigned_at;
        data.requests.insert(stored.id, stored);
        Ok(opened)
    }

    async fn list_assignments(
        &self,
        request: RequestId,
    ) -> RepositoryResult<Vec<MaintenanceAssignment>> {
        Ok(self
            .read()?
            .assignments
            .values()
            .filter(|a| a.maintenance_request == request)
            .cloned()
            .collect())
    }

    async fn record_work_log(
        &self,
        request: &MaintenanceRequest,
        log: &NewWorkLog,
    ) -> RepositoryResult<WorkLog> {
        let op = "record_work_log";
        let mut data = self.write()?;
        if !data.requests.contains_key(&request.id) {
            return Err(RepositoryError::missing(op, "maintenance_request", request.id));
        }
        data.require_user(op, log.technician)?;

        let id = WorkLogId::new(next(&mut data.counters.work_log));
        let stored = WorkLog {
            id,
            maintenance_request: log.maintenance_request,
            technician: log.technician,
            note: log.note.clone(),
            status: log.status,
            created_at: log.created_at,
        };
        data.work_logs.insert(id, stored.clone());

        let mut updated = request.clone();
        updated.updated_at = log.created_at;
        data.requests.insert(updated.id, updated);
        Ok(stored)
    }

    async fn list_work_logs(&self, request: RequestId) -> RepositoryResult<Vec<WorkLog>> {
        let mut logs: Vec<WorkLog> = self
            .read()?
            .work_logs
            .values()
            .filter(|l| l.maintenance_request == request)
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn company_draft(name: &str) -> CompanyDraft {
        CompanyDraft {
            name: name.to_string(),
            location: String::new(),
        }
    }

    fn work_center_draft(code: &str, company: CompanyId, alts: Vec<WorkCenterId>) -> WorkCenterDraft {
        WorkCenterDraft {
            name: format!("Center {}", code),
            code: code.to_string(),
            company,
            tag: String::new(),
            alternative_work_centers: alts,
            cost_per_hour: Decimal::from(100),
            capacity: 1,
            time_efficiency: Decimal::from(90),
            oee_target: Decimal::from(85),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let repo = LocalRepository::new();
        let a = repo.create_company(&company_draft("A")).await.unwrap();
        let b = repo.create_company(&company_draft("B")).await.unwrap();
        let d = repo
            .create_department(&DepartmentDraft {
                name: "Production".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(a.id.value(), 1);
        assert_eq!(b.id.value(), 2);
        assert_eq!(d.id.value(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_company_name_rejected() {
        let repo = LocalRepository::new();
        repo.create_company(&company_draft("Acme")).await.unwrap();
        let err = repo.create_company(&company_draft("Acme")).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_alternates_are_symmetric_and_unlinked_on_delete() {
        let repo = LocalRepository::new();
        let company = repo.create_company(&company_draft("Acme")).await.unwrap();
        let a = repo
            .create_work_center(&work_center_draft("A", company.id, vec![]))
            .await
            .unwrap();
        let b = repo
            .create_work_center(&work_center_draft("B", company.id, vec![a.id]))
            .await
            .unwrap();

        let a_after = repo.get_work_center(a.id).await.unwrap();
        assert_eq!(a_after.alternative_work_centers, vec![b.id]);

        repo.delete_work_center(b.id).await.unwrap();
        let a_after = repo.get_work_center(a.id).await.unwrap();
        assert!(a_after.alternative_work_centers.is_empty());
    }

    #[tokio::test]
    async fn test_update_drops_reverse_alternate_link() {
        let repo = LocalRepository::new();
        let company = repo.create_company(&company_draft("Acme")).await.unwrap();
        let a = repo
            .create_work_center(&work_center_draft("A", company.id, vec![]))
            .await
            .unwrap();
        let b = repo
            .create_work_center(&work_center_draft("B", company.id, vec![a.id]))
            .await
            .unwrap();

        repo.update_work_center(b.id, &work_center_draft("B", company.id, vec![]))
            .await
            .unwrap();
        let a_after = repo.get_work_center(a.id).await.unwrap();
        assert!(a_after.alternative_work_centers.is_empty());
    }

    #[tokio::test]
    async fn test_self_alternate_rejected() {
        let repo = LocalRepository::new();
        let company = repo.create_company(&company_draft("Acme")).await.unwrap();
        let a = repo
            .create_work_center(&work_center_draft("A", company.id, vec![]))
            .await
            .unwrap();
        let err = repo
            .update_work_center(a.id, &work_center_draft("A", company.id, vec![a.id]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_reads() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_companies().await.unwrap_err();
        assert!(err.is_retryable());

        repo.set_healthy(true);
        assert!(repo.list_companies().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let repo = LocalRepository::new();
        repo.create_company(&company_draft("Acme")).await.unwrap();
        repo.clear();
        let again = repo.create_company(&company_draft("Acme")).await.unwrap();
        assert_eq!(again.id.value(), 1);
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo.get_team(TeamId::new(4)).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
