//! Maintenance request workflows: availability, creation, update,
//! reassignment and work logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use super::escalation::apply_log;
use crate::access::{self, can_view_request};
use crate::api::{
    EquipmentId, MaintenanceAssignment, MaintenanceRequest, MaintenanceTeam, MaintenanceType,
    NewAssignment, NewMaintenanceRequest, NewWorkLog, Priority, RequestDetails, RequestId,
    RequestStatus, Role, TeamId, TimeWindow, UserId, WorkCenter, WorkCenterId, WorkLog,
    WorkLogStatus,
};
use crate::auth::Principal;
use crate::db::{
    AccountRepository, DirectoryRepository, FullRepository, MaintenanceRepository,
    RepositoryResult,
};
use crate::scheduler::{free_work_centers, pick_technician, Bookings};

/// Body of an availability check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub equipment: Option<EquipmentId>,
    #[serde(default)]
    pub maintenance_team: Option<TeamId>,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
}

/// Technician the engine would assign plus the work centers still free.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub assigned_technician: UserId,
    pub available_work_centers: Vec<WorkCenter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReassignInput {
    #[serde(default)]
    pub maintenance_id: Option<RequestId>,
    #[serde(default)]
    pub new_team: Option<TeamId>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
    pub maintenance_id: RequestId,
    pub new_team: TeamId,
    pub new_technician: UserId,
    pub reason: String,
    pub assignment: MaintenanceAssignment,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkLogInput {
    #[serde(default)]
    pub maintenance_id: Option<RequestId>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub status: Option<WorkLogStatus>,
}

/// Request fields after every create/update rule passed.
struct CheckedDetails {
    title: String,
    description: String,
    maintenance_type: MaintenanceType,
    priority: Priority,
    equipment: EquipmentId,
    work_center: WorkCenterId,
    assigned_team: Option<TeamId>,
    assigned_technician: UserId,
    scheduled_start: DateTime<Utc>,
    duration_hours: u32,
}

fn required<T>(value: Option<T>, field: &str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::validation(format!("{} is required.", field)))
}

/// Treat a missing referenced row as bad input rather than a missing resource.
fn referenced<T>(result: RepositoryResult<T>, message: &str) -> ServiceResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => Err(ServiceError::validation(message)),
        Err(e) => Err(e.into()),
    }
}

/// Longest slot a request may book; durations are stored as `INTEGER`.
pub const MAX_DURATION_HOURS: u32 = i32::MAX as u32;

fn positive_hours(hours: Option<u32>) -> ServiceResult<u32> {
    match required(hours, "duration_hours")? {
        0 => Err(ServiceError::validation(
            "duration_hours must be greater than zero.",
        )),
        hours if hours > MAX_DURATION_HOURS => Err(ServiceError::validation(format!(
            "duration_hours must not exceed {}.",
            MAX_DURATION_HOURS
        ))),
        hours => Ok(hours),
    }
}

fn slot(start: DateTime<Utc>, hours: u32) -> ServiceResult<TimeWindow> {
    TimeWindow::from_duration(start, hours).ok_or_else(|| {
        ServiceError::validation("Scheduled slot ends beyond the supported date range.")
    })
}

async fn check_details(
    repo: &dyn FullRepository,
    details: &RequestDetails,
    now: DateTime<Utc>,
) -> ServiceResult<CheckedDetails> {
    if details.title.trim().is_empty() {
        return Err(ServiceError::validation("title is required."));
    }
    let maintenance_type = required(details.maintenance_type, "maintenance_type")?;
    let equipment = required(details.equipment, "equipment")?;
    let work_center = required(details.work_center, "work_center")?;
    let assigned_technician = required(details.assigned_technician, "assigned_technician")?;
    let scheduled_start = required(details.scheduled_start, "scheduled_start")?;
    let duration_hours = positive_hours(details.duration_hours)?;

    if scheduled_start < now {
        return Err(ServiceError::validation(
            "Scheduled date cannot be in the past.",
        ));
    }
    slot(scheduled_start, duration_hours)?;

    referenced(repo.get_equipment(equipment).await, "Invalid equipment.")?;
    referenced(repo.get_work_center(work_center).await, "Invalid work center.")?;
    if let Some(team) = details.assigned_team {
        referenced(repo.get_team(team).await, "Invalid maintenance team.")?;
    }
    let technician = referenced(
        repo.get_user(assigned_technician).await,
        "Invalid technician.",
    )?;
    if technician.role != Role::Technician {
        return Err(ServiceError::validation(
            "Assigned user is not a technician.",
        ));
    }

    Ok(CheckedDetails {
        title: details.title.trim().to_string(),
        description: details.description.clone(),
        maintenance_type,
        priority: details.priority,
        equipment,
        work_center,
        assigned_team: details.assigned_team,
        assigned_technician,
        scheduled_start,
        duration_hours,
    })
}

/// Teams the caller is a member of; only technicians need them.
async fn member_teams(repo: &dyn FullRepository, principal: &Principal) -> ServiceResult<Vec<TeamId>> {
    if !principal.is_technician() {
        return Ok(Vec::new());
    }
    Ok(repo
        .list_teams()
        .await?
        .into_iter()
        .filter(|team| team.has_member(principal.user_id))
        .map(|team| team.id)
        .collect())
}

async fn team_for(repo: &dyn FullRepository, team: TeamId) -> ServiceResult<MaintenanceTeam> {
    referenced(repo.get_team(team).await, "Invalid maintenance team.")
}

/// A maintenance referenced from a request body rather than the path.
async fn body_request(
    repo: &dyn FullRepository,
    id: Option<RequestId>,
) -> ServiceResult<MaintenanceRequest> {
    let id = required(id, "maintenance_id")?;
    referenced(repo.get_request(id).await, "Invalid maintenance.")
}

// =============================================================================
// Availability
// =============================================================================

/// Pick a technician from the team and list the caller's free work centers.
///
/// Fails with [`ServiceError::Conflict`] when every team member already has a
/// booking starting inside the window.
pub async fn check_availability(
    repo: &dyn FullRepository,
    principal: &Principal,
    query: &AvailabilityQuery,
) -> ServiceResult<Availability> {
    let equipment = required(query.equipment, "equipment")?;
    let team = required(query.maintenance_team, "maintenance_team")?;
    let start = required(query.scheduled_start, "scheduled_start")?;
    let hours = positive_hours(query.duration_hours)?;

    referenced(repo.get_equipment(equipment).await, "Invalid equipment.")?;
    let team = team_for(repo, team).await?;

    let window = slot(start, hours)?;
    let booked = repo.list_booked_in_window(&window).await?;
    let bookings = Bookings::new(window, &booked);

    let technician = pick_technician(&team, &bookings).ok_or_else(|| {
        ServiceError::Conflict("No technician available for the selected time slot.".to_string())
    })?;

    let candidates: Vec<WorkCenter> = repo
        .list_work_centers()
        .await?
        .into_iter()
        .filter(|center| access::work_center_in_scope(principal, center))
        .collect();

    Ok(Availability {
        assigned_technician: technician,
        available_work_centers: free_work_centers(candidates, &bookings),
    })
}

// =============================================================================
// Requests
// =============================================================================

/// Create a scheduled request and its initial assignment.
pub async fn create_request(
    repo: &dyn FullRepository,
    principal: &Principal,
    details: &RequestDetails,
) -> ServiceResult<MaintenanceRequest> {
    let company = principal
        .company
        .ok_or_else(|| ServiceError::validation("User must belong to a company."))?;
    let now = Utc::now();
    let checked = check_details(repo, details, now).await?;

    let new = NewMaintenanceRequest {
        title: checked.title,
        description: checked.description,
        maintenance_type: checked.maintenance_type,
        priority: checked.priority,
        status: RequestStatus::Scheduled,
        equipment: checked.equipment,
        work_center: checked.work_center,
        company,
        department: principal.department,
        created_by: principal.user_id,
        assigned_team: checked.assigned_team,
        assigned_technician: checked.assigned_technician,
        scheduled_start: checked.scheduled_start,
        duration_hours: checked.duration_hours,
        created_at: now,
    };
    let created = repo.create_request(&new).await?;
    log::info!(
        "Maintenance {} created by user {} for technician {}",
        created.id,
        principal.user_id,
        checked.assigned_technician
    );
    Ok(created)
}

/// A request the caller may see; invisible and missing look the same.
pub async fn get_request(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: RequestId,
) -> ServiceResult<MaintenanceRequest> {
    let request = repo.get_request(id).await?;
    let teams = member_teams(repo, principal).await?;
    if can_view_request(principal, &request, &teams) {
        Ok(request)
    } else {
        Err(ServiceError::not_found(format!("Maintenance {} not found.", id)))
    }
}

/// Visible requests, newest first.
pub async fn list_requests(
    repo: &dyn FullRepository,
    principal: &Principal,
) -> ServiceResult<Vec<MaintenanceRequest>> {
    let teams = member_teams(repo, principal).await?;
    Ok(repo
        .list_requests()
        .await?
        .into_iter()
        .filter(|request| can_view_request(principal, request, &teams))
        .collect())
}

/// Overwrite the writable fields of a visible request.
///
/// Status, creator, company and department are kept. Changing the technician
/// or team closes the active assignment and opens one for the new pair.
pub async fn update_request(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: RequestId,
    details: &RequestDetails,
) -> ServiceResult<MaintenanceRequest> {
    let mut request = get_request(repo, principal, id).await?;
    let checked = check_details(repo, details, Utc::now()).await?;
    let reassigned = request.assigned_technician != Some(checked.assigned_technician)
        || request.assigned_team != checked.assigned_team;

    request.title = checked.title;
    request.description = checked.description;
    request.maintenance_type = checked.maintenance_type;
    request.priority = checked.priority;
    request.equipment = checked.equipment;
    request.work_center = checked.work_center;
    request.assigned_team = checked.assigned_team;
    request.assigned_technician = Some(checked.assigned_technician);
    request.scheduled_start = Some(checked.scheduled_start);
    request.duration_hours = Some(checked.duration_hours);

    let updated = if reassigned {
        repo.record_reassignment(
            &request,
            &NewAssignment {
                maintenance_request: request.id,
                assigned_team: checked.assigned_team,
                assigned_technician: checked.assigned_technician,
                assigned_by: principal.user_id,
                assigned_at: Utc::now(),
            },
        )
        .await?;
        log::info!(
            "Maintenance {} handed to technician {} by user {}",
            id,
            checked.assigned_technician,
            principal.user_id
        );
        repo.get_request(id).await?
    } else {
        repo.update_request(&request).await?
    };
    log::info!("Maintenance {} updated by user {}", id, principal.user_id);
    Ok(updated)
}

// =============================================================================
// Reassignment
// =============================================================================

/// Move a request to another team, picking a free technician from it.
///
/// The current assignment stays active when nobody in the new team is free.
pub async fn reassign(
    repo: &dyn FullRepository,
    principal: &Principal,
    input: &ReassignInput,
) -> ServiceResult<Reassignment> {
    access::require_technician(principal, "reassign maintenance")?;
    let mut request = body_request(repo, input.maintenance_id).await?;
    let new_team = required(input.new_team, "new_team")?;
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::validation("reason is required."));
    }
    access::check_reassign(principal, &request)?;

    let team = team_for(repo, new_team).await?;
    let window = request
        .window()
        .ok_or_else(|| ServiceError::validation("Maintenance has no scheduled slot."))?;
    let booked = repo.list_booked_in_window(&window).await?;
    let technician = pick_technician(&team, &Bookings::new(window, &booked)).ok_or_else(|| {
        ServiceError::validation("No technician available in the selected team.")
    })?;

    request.assigned_team = Some(team.id);
    request.assigned_technician = Some(technician);
    request.priority = Priority::Critical;

    let assignment = repo
        .record_reassignment(
            &request,
            &NewAssignment {
                maintenance_request: request.id,
                assigned_team: Some(team.id),
                assigned_technician: technician,
                assigned_by: principal.user_id,
                assigned_at: Utc::now(),
            },
        )
        .await?;
    log::info!(
        "Maintenance {} reassigned by {} to team {} technician {}: {}",
        request.id,
        principal.user_id,
        team.id,
        technician,
        reason
    );

    Ok(Reassignment {
        maintenance_id: request.id,
        new_team: team.id,
        new_technician: technician,
        reason: reason.to_string(),
        assignment,
    })
}

/// Assignment history of a visible request, oldest first.
pub async fn list_assignments(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: RequestId,
) -> ServiceResult<Vec<MaintenanceAssignment>> {
    let request = get_request(repo, principal, id).await?;
    Ok(repo.list_assignments(request.id).await?)
}

// =============================================================================
// Work logs
// =============================================================================

/// Append a work log and escalate the parent request.
pub async fn add_work_log(
    repo: &dyn FullRepository,
    principal: &Principal,
    input: &WorkLogInput,
) -> ServiceResult<WorkLog> {
    access::require_technician(principal, "add work logs")?;
    let request = body_request(repo, input.maintenance_id).await?;
    let status = required(input.status, "status")?;
    if input.note.trim().is_empty() {
        return Err(ServiceError::validation("note is required."));
    }
    access::check_work_log(principal, &request)?;

    let mut updated = request.clone();
    apply_log(&request, status).apply_to(&mut updated);

    let log = repo
        .record_work_log(
            &updated,
            &NewWorkLog {
                maintenance_request: request.id,
                technician: principal.user_id,
                note: input.note.trim().to_string(),
                status,
                created_at: Utc::now(),
            },
        )
        .await?;
    log::info!(
        "Work log {} on maintenance {}: {} -> {} ({})",
        log.id,
        request.id,
        request.status,
        updated.status,
        updated.priority
    );
    Ok(log)
}

/// Work logs of a visible request, oldest first.
pub async fn list_work_logs(
    repo: &dyn FullRepository,
    principal: &Principal,
    id: RequestId,
) -> ServiceResult<Vec<WorkLog>> {
    let request = get_request(repo, principal, id).await?;
    Ok(repo.list_work_logs(request.id).await?)
}
