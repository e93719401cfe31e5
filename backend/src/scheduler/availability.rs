use crate::api::{MaintenanceRequest, MaintenanceTeam, TimeWindow, UserId, WorkCenter};

/// Requests that already occupy people and places around a window.
///
/// Only requests whose start falls inside the window count; a booking that
/// started just before the window and runs into it does not block anything.
#[derive(Debug, Clone)]
pub struct Bookings<'a> {
    window: TimeWindow,
    requests: &'a [MaintenanceRequest],
}

impl<'a> Bookings<'a> {
    pub fn new(window: TimeWindow, requests: &'a [MaintenanceRequest]) -> Self {
        Self { window, requests }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    fn active(&self) -> impl Iterator<Item = &'a MaintenanceRequest> + '_ {
        self.requests.iter().filter(|r| r.starts_in(&self.window))
    }
}

/// Whether `technician` has no booked request starting inside the window.
pub fn is_technician_available(technician: UserId, bookings: &Bookings<'_>) -> bool {
    !bookings
        .active()
        .any(|r| r.assigned_technician == Some(technician))
}

/// First team member, in membership order, who is free for the window.
pub fn pick_technician(team: &MaintenanceTeam, bookings: &Bookings<'_>) -> Option<UserId> {
    let picked = team
        .members
        .iter()
        .copied()
        .find(|member| is_technician_available(*member, bookings));
    match picked {
        Some(technician) => log::debug!(
            "Picked technician {} from team {} for window starting {}",
            technician,
            team.id,
            bookings.window().start
        ),
        None => log::debug!(
            "No free technician in team {} for window starting {}",
            team.id,
            bookings.window().start
        ),
    }
    picked
}

/// Candidates not referenced by any booked request starting in the window.
///
/// Bookings from every company count, so callers pass the company-scoped
/// candidate list and the unscoped booking snapshot.
pub fn free_work_centers(candidates: Vec<WorkCenter>, bookings: &Bookings<'_>) -> Vec<WorkCenter> {
    candidates
        .into_iter()
        .filter(|center| !bookings.active().any(|r| r.work_center == center.id))
        .collect()
}
