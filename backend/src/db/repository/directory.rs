//! Directory (reference data) repository trait.
//!
//! Every entity follows the same shape: list, get, create from a draft,
//! full update from a draft, delete. Deletes are rejected with
//! [`RepositoryError::ValidationError`](super::RepositoryError) while another
//! row still references the target.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    CategoryId, Company, CompanyDraft, CompanyId, Department, DepartmentDraft, DepartmentId,
    Equipment, EquipmentCategory, EquipmentCategoryDraft, EquipmentDraft, EquipmentId,
    MaintenanceTeam, MaintenanceTeamDraft, TeamId, WorkCenter, WorkCenterDraft, WorkCenterId,
};

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    // ==================== Companies ====================

    /// List companies ordered by ID.
    async fn list_companies(&self) -> RepositoryResult<Vec<Company>>;

    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company>;

    /// Store a new company.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the name is already taken
    async fn create_company(&self, draft: &CompanyDraft) -> RepositoryResult<Company>;

    async fn update_company(&self, id: CompanyId, draft: &CompanyDraft)
        -> RepositoryResult<Company>;

    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()>;

    // ==================== Departments ====================

    async fn list_departments(&self) -> RepositoryResult<Vec<Department>>;

    async fn get_department(&self, id: DepartmentId) -> RepositoryResult<Department>;

    async fn create_department(&self, draft: &DepartmentDraft) -> RepositoryResult<Department>;

    async fn update_department(
        &self,
        id: DepartmentId,
        draft: &DepartmentDraft,
    ) -> RepositoryResult<Department>;

    async fn delete_department(&self, id: DepartmentId) -> RepositoryResult<()>;

    // ==================== Equipment categories ====================

    async fn list_categories(&self) -> RepositoryResult<Vec<EquipmentCategory>>;

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<EquipmentCategory>;

    async fn create_category(
        &self,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory>;

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory>;

    /// Delete a category.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If equipment still uses the category
    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()>;

    // ==================== Equipment ====================

    async fn list_equipment(&self) -> RepositoryResult<Vec<Equipment>>;

    async fn get_equipment(&self, id: EquipmentId) -> RepositoryResult<Equipment>;

    /// Store new equipment.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the serial number is taken or
    ///   a referenced company/category/department/employee does not exist
    async fn create_equipment(&self, draft: &EquipmentDraft) -> RepositoryResult<Equipment>;

    async fn update_equipment(
        &self,
        id: EquipmentId,
        draft: &EquipmentDraft,
    ) -> RepositoryResult<Equipment>;

    async fn delete_equipment(&self, id: EquipmentId) -> RepositoryResult<()>;

    // ==================== Work centers ====================

    async fn list_work_centers(&self) -> RepositoryResult<Vec<WorkCenter>>;

    async fn get_work_center(&self, id: WorkCenterId) -> RepositoryResult<WorkCenter>;

    /// Store a new work center and link its alternates in both directions.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the code is taken or an
    ///   alternate does not exist
    async fn create_work_center(&self, draft: &WorkCenterDraft) -> RepositoryResult<WorkCenter>;

    /// Overwrite a work center. Alternates dropped from the draft are also
    /// unlinked on the other side.
    async fn update_work_center(
        &self,
        id: WorkCenterId,
        draft: &WorkCenterDraft,
    ) -> RepositoryResult<WorkCenter>;

    /// Delete a work center and remove it from every alternate list.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If a request still uses it
    async fn delete_work_center(&self, id: WorkCenterId) -> RepositoryResult<()>;

    // ==================== Maintenance teams ====================

    async fn list_teams(&self) -> RepositoryResult<Vec<MaintenanceTeam>>;

    /// Retrieve a team with its members in insertion order.
    async fn get_team(&self, id: TeamId) -> RepositoryResult<MaintenanceTeam>;

    async fn create_team(&self, draft: &MaintenanceTeamDraft) -> RepositoryResult<MaintenanceTeam>;

    /// Overwrite a team; the member list is replaced as a whole.
    async fn update_team(
        &self,
        id: TeamId,
        draft: &MaintenanceTeamDraft,
    ) -> RepositoryResult<MaintenanceTeam>;

    async fn delete_team(&self, id: TeamId) -> RepositoryResult<()>;
}
