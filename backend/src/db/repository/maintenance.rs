//! Maintenance request repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    MaintenanceAssignment, MaintenanceRequest, NewAssignment, NewMaintenanceRequest, NewWorkLog,
    RequestId, TimeWindow, WorkLog,
};

/// Repository trait for requests, their assignment history and work logs.
///
/// Multi-row writes (a request plus its initial assignment, a reassignment,
/// a work log plus the request it escalates) are single operations so that a
/// backend can run each of them in one transaction.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    // ==================== Requests ====================

    /// Store a new request together with its initial active assignment
    /// (`assigned_by` is the creator).
    ///
    /// # Returns
    /// * `Ok(MaintenanceRequest)` - The stored request with its assigned ID
    /// * `Err(RepositoryError::ValidationError)` - If a referenced row is missing
    async fn create_request(
        &self,
        request: &NewMaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest>;

    /// Retrieve a request by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the request doesn't exist
    async fn get_request(&self, id: RequestId) -> RepositoryResult<MaintenanceRequest>;

    /// List every request, newest first.
    async fn list_requests(&self) -> RepositoryResult<Vec<MaintenanceRequest>>;

    /// Overwrite the mutable fields of a stored request and bump `updated_at`.
    async fn update_request(
        &self,
        request: &MaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest>;

    /// Requests in a booked status (scheduled, in progress) whose scheduled
    /// start lies inside `window`, across all companies.
    async fn list_booked_in_window(
        &self,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<MaintenanceRequest>>;

    // ==================== Assignments ====================

    /// Close the request's active assignment, open `assignment` as the new
    /// active one and persist the request's updated fields.
    ///
    /// # Arguments
    /// * `request` - The request with its new team, technician and priority
    /// * `assignment` - The assignment row to open
    ///
    /// # Returns
    /// * `Ok(MaintenanceAssignment)` - The newly active assignment
    async fn record_reassignment(
        &self,
        request: &MaintenanceRequest,
        assignment: &NewAssignment,
    ) -> RepositoryResult<MaintenanceAssignment>;

    /// Assignment history of a request, oldest first.
    async fn list_assignments(
        &self,
        request: RequestId,
    ) -> RepositoryResult<Vec<MaintenanceAssignment>>;

    // ==================== Work logs ====================

    /// Append a work log and persist the request's resulting status/priority.
    async fn record_work_log(
        &self,
        request: &MaintenanceRequest,
        log: &NewWorkLog,
    ) -> RepositoryResult<WorkLog>;

    /// Work logs of a request, oldest first.
    async fn list_work_logs(&self, request: RequestId) -> RepositoryResult<Vec<WorkLog>>;
}
