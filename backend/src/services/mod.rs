//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. Every
//! operation takes the repository and, where the caller matters, the
//! per-request [`crate::auth::Principal`]; access rules come from
//! [`crate::access`] and the assignment picker from [`crate::scheduler`].

pub mod accounts;
pub mod directory;
pub mod error;
pub mod escalation;
pub mod maintenance;
pub mod views;

pub use error::{ServiceError, ServiceResult};
pub use escalation::{apply_log, RequestTransition};
pub use maintenance::{Availability, AvailabilityQuery, ReassignInput, Reassignment, WorkLogInput};
