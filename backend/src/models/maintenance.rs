//! Maintenance requests, their assignment history and work logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{
    AssignmentId, CompanyId, DepartmentId, EquipmentId, RequestId, TeamId, UserId, WorkCenterId,
    WorkLogId,
};
use crate::define_choice_enum;
use crate::models::window::TimeWindow;

define_choice_enum!(
    MaintenanceType {
        Preventive => "preventive",
        Corrective => "corrective",
    }
);

define_choice_enum!(
    /// Ordered from least to most urgent.
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

define_choice_enum!(
    RequestStatus {
        New => "new",
        Scheduled => "scheduled",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

impl RequestStatus {
    /// Statuses that occupy a technician and a work center.
    pub const BOOKED: [RequestStatus; 2] = [RequestStatus::Scheduled, RequestStatus::InProgress];

    pub fn is_booked(&self) -> bool {
        Self::BOOKED.contains(self)
    }

    /// No further work logs are accepted once terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

define_choice_enum!(
    WorkLogStatus {
        InProgress => "in_progress",
        Blocked => "blocked",
        Completed => "completed",
    }
);

/// The ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub title: String,
    pub description: String,
    pub maintenance_type: MaintenanceType,
    pub priority: Priority,
    pub status: RequestStatus,
    pub equipment: EquipmentId,
    pub work_center: WorkCenterId,
    pub company: CompanyId,
    pub department: Option<DepartmentId>,
    pub created_by: UserId,
    pub assigned_team: Option<TeamId>,
    pub assigned_technician: Option<UserId>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub duration_hours: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceRequest {
    /// Booked slot, when both start and duration are known.
    pub fn window(&self) -> Option<TimeWindow> {
        match (self.scheduled_start, self.duration_hours) {
            (Some(start), Some(hours)) => TimeWindow::from_duration(start, hours),
            _ => None,
        }
    }

    /// Whether this request books `technician` with a start inside `window`.
    pub fn books_technician_in(&self, technician: UserId, window: &TimeWindow) -> bool {
        self.assigned_technician == Some(technician) && self.starts_in(window)
    }

    /// Active booking whose start falls inside `window`.
    pub fn starts_in(&self, window: &TimeWindow) -> bool {
        self.status.is_booked()
            && self
                .scheduled_start
                .map(|start| window.contains(start))
                .unwrap_or(false)
    }
}

/// Writable request fields sent by clients on create and update.
///
/// Scheduling fields are optional at the wire level so that a missing one
/// produces a field-specific validation message rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub maintenance_type: Option<MaintenanceType>,
    #[serde(default)]
    pub priority: Priority,
    pub equipment: Option<EquipmentId>,
    #[serde(default)]
    pub work_center: Option<WorkCenterId>,
    #[serde(default)]
    pub assigned_team: Option<TeamId>,
    #[serde(default)]
    pub assigned_technician: Option<UserId>,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_hours: Option<u32>,
}

/// Insert payload for a request; produced by the service after validation.
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub title: String,
    pub description: String,
    pub maintenance_type: MaintenanceType,
    pub priority: Priority,
    pub status: RequestStatus,
    pub equipment: EquipmentId,
    pub work_center: WorkCenterId,
    pub company: CompanyId,
    pub department: Option<DepartmentId>,
    pub created_by: UserId,
    pub assigned_team: Option<TeamId>,
    pub assigned_technician: UserId,
    pub scheduled_start: DateTime<Utc>,
    pub duration_hours: u32,
    pub created_at: DateTime<Utc>,
}

/// One technician/team binding; history is kept through inactive rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAssignment {
    pub id: AssignmentId,
    pub maintenance_request: RequestId,
    pub assigned_team: Option<TeamId>,
    pub assigned_technician: Option<UserId>,
    pub assigned_by: Option<UserId>,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub maintenance_request: RequestId,
    pub assigned_team: Option<TeamId>,
    pub assigned_technician: UserId,
    pub assigned_by: UserId,
    pub assigned_at: DateTime<Utc>,
}

/// Append-only progress note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: WorkLogId,
    pub maintenance_request: RequestId,
    pub technician: UserId,
    pub note: String,
    pub status: WorkLogStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWorkLog {
    pub maintenance_request: RequestId,
    pub technician: UserId,
    pub note: String,
    pub status: WorkLogStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn request(status: RequestStatus, start_hour: u32) -> MaintenanceRequest {
        let created = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        MaintenanceRequest {
            id: RequestId::new(1),
            title: "Spindle noise".to_string(),
            description: String::new(),
            maintenance_type: MaintenanceType::Corrective,
            priority: Priority::Medium,
            status,
            equipment: EquipmentId::new(1),
            work_center: WorkCenterId::new(1),
            company: CompanyId::new(1),
            department: None,
            created_by: UserId::new(1),
            assigned_team: None,
            assigned_technician: Some(UserId::new(7)),
            scheduled_start: Some(Utc.with_ymd_and_hms(2030, 1, 10, start_hour, 0, 0).unwrap()),
            duration_hours: Some(2),
            created_at: created,
            updated_at: created,
        }
    }

    fn window(hour: u32, hours: u32) -> TimeWindow {
        TimeWindow::from_duration(Utc.with_ymd_and_hms(2030, 1, 10, hour, 0, 0).unwrap(), hours).unwrap()
    }

    #[test]
    fn test_status_text_matches_serde() {
        for status in RequestStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(RequestStatus::from_str(status.as_str()).unwrap(), *status);
        }
        assert_eq!(WorkLogStatus::from_str("blocked").unwrap(), WorkLogStatus::Blocked);
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_booked_and_terminal_statuses() {
        assert!(RequestStatus::Scheduled.is_booked());
        assert!(RequestStatus::InProgress.is_booked());
        assert!(!RequestStatus::New.is_booked());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(!RequestStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_books_technician_only_when_start_in_window() {
        let req = request(RequestStatus::Scheduled, 9);
        assert!(req.books_technician_in(UserId::new(7), &window(8, 2)));
        assert!(!req.books_technician_in(UserId::new(8), &window(8, 2)));
        // Existing booking started before the window: not a conflict.
        assert!(!req.books_technician_in(UserId::new(7), &window(10, 2)));
    }

    #[test]
    fn test_completed_request_does_not_book() {
        let req = request(RequestStatus::Completed, 9);
        assert!(!req.starts_in(&window(8, 2)));
    }

    #[test]
    fn test_request_details_parse_with_missing_schedule() {
        let json = r#"{
            "title": "Oil leak",
            "maintenance_type": "corrective",
            "equipment": 3
        }"#;
        let details: RequestDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.priority, Priority::Medium);
        assert!(details.scheduled_start.is_none());
        assert_eq!(details.equipment, Some(EquipmentId::new(3)));
    }
}
