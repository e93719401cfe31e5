//! Visibility and authorization rules.
//!
//! Every rule is a pure predicate over a [`Principal`] and the row being
//! accessed, so services filter and gate with these functions and nothing
//! here touches storage.

use thiserror::Error;

use crate::api::{Equipment, MaintenanceRequest, MaintenanceTeam, TeamId, WorkCenter};
use crate::auth::Principal;

/// Why a request-level action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    /// The caller's role may not perform the action at all.
    #[error("{0}")]
    Forbidden(String),
    /// The role is right but the request's state or ownership is not.
    #[error("{0}")]
    Invalid(String),
}

// =============================================================================
// Reference data
// =============================================================================

/// Only admins create, update or delete reference data.
pub fn can_manage_directory(principal: &Principal) -> bool {
    principal.is_admin()
}

/// Owned equipment or equipment of the caller's department, whatever the role.
pub fn equipment_in_scope(principal: &Principal, equipment: &Equipment) -> bool {
    equipment.employee == Some(principal.user_id) || principal.shares_department(equipment.department)
}

/// Equipment list/detail rule: admins see everything.
pub fn can_view_equipment(principal: &Principal, equipment: &Equipment) -> bool {
    principal.is_admin() || equipment_in_scope(principal, equipment)
}

/// Work-center list/detail rule: admins see everything, others their company.
pub fn can_view_work_center(principal: &Principal, center: &WorkCenter) -> bool {
    principal.is_admin() || principal.belongs_to(center.company)
}

/// Work-center select rule: company-scoped for every role.
pub fn work_center_in_scope(principal: &Principal, center: &WorkCenter) -> bool {
    principal.belongs_to(center.company)
}

pub fn can_view_team(principal: &Principal, team: &MaintenanceTeam) -> bool {
    principal.is_admin() || principal.belongs_to(team.company)
}

// =============================================================================
// Maintenance requests
// =============================================================================

/// Request visibility.
///
/// `member_of` lists the teams the caller belongs to; only technicians use it.
pub fn can_view_request(
    principal: &Principal,
    request: &MaintenanceRequest,
    member_of: &[TeamId],
) -> bool {
    if principal.is_admin() {
        return true;
    }
    if principal.is_technician() {
        return request.assigned_technician == Some(principal.user_id)
            || request
                .assigned_team
                .map(|team| member_of.contains(&team))
                .unwrap_or(false);
    }
    request.created_by == principal.user_id || principal.shares_department(request.department)
}

/// Role gate shared by the technician-only actions.
pub fn require_technician(principal: &Principal, action: &str) -> Result<(), Denial> {
    if principal.is_technician() {
        Ok(())
    } else {
        Err(Denial::Forbidden(format!("Only technicians can {}.", action)))
    }
}

fn require_assignee(principal: &Principal, request: &MaintenanceRequest) -> Result<(), Denial> {
    if request.assigned_technician == Some(principal.user_id) {
        Ok(())
    } else {
        Err(Denial::Invalid(
            "You are not the assigned technician for this maintenance.".to_string(),
        ))
    }
}

/// Gate for appending a work log.
pub fn check_work_log(principal: &Principal, request: &MaintenanceRequest) -> Result<(), Denial> {
    require_technician(principal, "add work logs")?;
    if request.status.is_terminal() {
        return Err(Denial::Invalid(format!(
            "Cannot add work logs to a {} maintenance.",
            request.status
        )));
    }
    require_assignee(principal, request)
}

/// Gate for moving a request to another team.
pub fn check_reassign(principal: &Principal, request: &MaintenanceRequest) -> Result<(), Denial> {
    require_technician(principal, "reassign maintenance")?;
    require_assignee(principal, request)?;
    if !request.status.is_booked() {
        return Err(Denial::Invalid(format!(
            "Cannot reassign a maintenance in status {}.",
            request.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn principal(id: i64, role: Role, company: Option<i64>, department: Option<i64>) -> Principal {
        Principal {
            user_id: UserId::new(id),
            email: format!("{}@test.com", id),
            role,
            company: company.map(CompanyId::new),
            department: department.map(DepartmentId::new),
        }
    }

    fn request(status: RequestStatus) -> MaintenanceRequest {
        let now = Utc::now();
        MaintenanceRequest {
            id: RequestId::new(1),
            title: "Belt replacement".to_string(),
            description: String::new(),
            maintenance_type: MaintenanceType::Preventive,
            priority: Priority::Low,
            status,
            equipment: EquipmentId::new(1),
            work_center: WorkCenterId::new(1),
            company: CompanyId::new(1),
            department: Some(DepartmentId::new(3)),
            created_by: UserId::new(10),
            assigned_team: Some(TeamId::new(4)),
            assigned_technician: Some(UserId::new(20)),
            scheduled_start: Some(now),
            duration_hours: Some(2),
            created_at: now,
            updated_at: now,
        }
    }

    fn equipment(employee: Option<i64>, department: Option<i64>) -> Equipment {
        Equipment {
            id: EquipmentId::new(1),
            name: "Lathe".to_string(),
            serial_number: "L-1".to_string(),
            purchase_date: None,
            warranty_expiration: None,
            last_maintenance_service_date: None,
            maintenance_interval_days: None,
            company: CompanyId::new(1),
            category: CategoryId::new(1),
            employee: employee.map(UserId::new),
            department: department.map(DepartmentId::new),
        }
    }

    fn work_center(company: i64) -> WorkCenter {
        WorkCenter {
            id: WorkCenterId::new(1),
            name: "Line A".to_string(),
            code: "LA".to_string(),
            company: CompanyId::new(company),
            tag: String::new(),
            alternative_work_centers: vec![],
            cost_per_hour: Decimal::ZERO,
            capacity: 1,
            time_efficiency: Decimal::from(100),
            oee_target: Decimal::from(100),
        }
    }

    #[test]
    fn test_only_admin_manages_directory() {
        assert!(can_manage_directory(&principal(1, Role::Admin, None, None)));
        assert!(!can_manage_directory(&principal(1, Role::Technician, None, None)));
        assert!(!can_manage_directory(&principal(1, Role::User, None, None)));
    }

    #[test]
    fn test_admin_sees_every_request() {
        let admin = principal(1, Role::Admin, None, None);
        assert!(can_view_request(&admin, &request(RequestStatus::Scheduled), &[]));
    }

    #[test]
    fn test_technician_sees_assigned_or_team_requests() {
        let assigned = principal(20, Role::Technician, Some(1), None);
        let teammate = principal(21, Role::Technician, Some(1), None);
        let outsider = principal(22, Role::Technician, Some(1), Some(3));
        let req = request(RequestStatus::Scheduled);

        assert!(can_view_request(&assigned, &req, &[]));
        assert!(can_view_request(&teammate, &req, &[TeamId::new(4)]));
        // Sharing the department is not enough for technicians.
        assert!(!can_view_request(&outsider, &req, &[TeamId::new(9)]));
    }

    #[test]
    fn test_user_sees_own_or_department_requests() {
        let creator = principal(10, Role::User, Some(1), None);
        let colleague = principal(11, Role::User, Some(1), Some(3));
        let stranger = principal(12, Role::User, Some(1), Some(5));
        let req = request(RequestStatus::New);

        assert!(can_view_request(&creator, &req, &[]));
        assert!(can_view_request(&colleague, &req, &[]));
        assert!(!can_view_request(&stranger, &req, &[]));
    }

    #[test]
    fn test_equipment_visibility() {
        let user = principal(7, Role::User, Some(1), Some(2));
        assert!(can_view_equipment(&user, &equipment(Some(7), None)));
        assert!(can_view_equipment(&user, &equipment(None, Some(2))));
        assert!(!can_view_equipment(&user, &equipment(Some(8), Some(9))));

        let admin = principal(1, Role::Admin, None, None);
        assert!(can_view_equipment(&admin, &equipment(Some(8), Some(9))));
        // The select rule ignores the admin shortcut.
        assert!(!equipment_in_scope(&admin, &equipment(Some(8), Some(9))));
    }

    #[test]
    fn test_work_center_scoped_to_company() {
        let user = principal(7, Role::User, Some(1), None);
        assert!(can_view_work_center(&user, &work_center(1)));
        assert!(!can_view_work_center(&user, &work_center(2)));

        let admin = principal(1, Role::Admin, Some(1), None);
        assert!(can_view_work_center(&admin, &work_center(2)));
        assert!(!work_center_in_scope(&admin, &work_center(2)));
    }

    #[test]
    fn test_work_log_requires_technician() {
        let user = principal(20, Role::User, None, None);
        let denial = check_work_log(&user, &request(RequestStatus::Scheduled)).unwrap_err();
        assert!(matches!(denial, Denial::Forbidden(_)));
    }

    #[test]
    fn test_work_log_rejected_on_terminal_request() {
        let tech = principal(20, Role::Technician, None, None);
        for status in [RequestStatus::Completed, RequestStatus::Cancelled] {
            let denial = check_work_log(&tech, &request(status)).unwrap_err();
            assert!(matches!(denial, Denial::Invalid(_)));
        }
        assert!(check_work_log(&tech, &request(RequestStatus::InProgress)).is_ok());
    }

    #[test]
    fn test_work_log_rejected_for_other_technician() {
        let other = principal(21, Role::Technician, None, None);
        let denial = check_work_log(&other, &request(RequestStatus::Scheduled)).unwrap_err();
        assert!(matches!(denial, Denial::Invalid(_)));
    }

    #[test]
    fn test_reassign_only_while_booked() {
        let tech = principal(20, Role::Technician, None, None);
        assert!(check_reassign(&tech, &request(RequestStatus::Scheduled)).is_ok());
        assert!(check_reassign(&tech, &request(RequestStatus::InProgress)).is_ok());
        assert!(check_reassign(&tech, &request(RequestStatus::New)).is_err());
        assert!(check_reassign(&tech, &request(RequestStatus::Completed)).is_err());
    }
}
