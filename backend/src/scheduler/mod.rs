//! Technician and work-center availability.
//!
//! The engine works on a snapshot of booked requests (status scheduled or
//! in progress) whose start lies in the window being asked about. Callers
//! fetch that snapshot once from the repository and then run the pure
//! functions in [`availability`] against it.

pub mod availability;

pub use availability::{free_work_centers, is_technician_available, pick_technician, Bookings};
