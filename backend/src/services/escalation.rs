//! Request status/priority transitions driven by work logs.

use serde::Serialize;

use crate::api::{MaintenanceRequest, Priority, RequestStatus, WorkLogStatus};

/// Status and priority a request takes after a work log is recorded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RequestTransition {
    pub status: RequestStatus,
    pub priority: Priority,
}

impl RequestTransition {
    /// Copy the transition onto `request`.
    pub fn apply_to(&self, request: &mut MaintenanceRequest) {
        request.status = self.status;
        request.priority = self.priority;
    }
}

/// Transition for a log with `log_status` posted against `request`.
///
/// Progress and blocked logs put the request in progress and escalate it to
/// critical; a completed log closes it and leaves the priority alone.
pub fn apply_log(request: &MaintenanceRequest, log_status: WorkLogStatus) -> RequestTransition {
    match log_status {
        WorkLogStatus::InProgress | WorkLogStatus::Blocked => RequestTransition {
            status: RequestStatus::InProgress,
            priority: Priority::Critical,
        },
        WorkLogStatus::Completed => RequestTransition {
            status: RequestStatus::Completed,
            priority: request.priority,
        },
    }
}
