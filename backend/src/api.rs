//! Public API surface for the backend.
//!
//! This file consolidates the identifier newtypes and re-exports the domain
//! types used by the HTTP layer, the service layer and the repositories.
//! All types derive Serialize/Deserialize for JSON serialization.

use crate::define_id_type;

define_id_type!(i64, CompanyId);
define_id_type!(i64, DepartmentId);
define_id_type!(i64, UserId);
define_id_type!(i64, CategoryId);
define_id_type!(i64, EquipmentId);
define_id_type!(i64, WorkCenterId);
define_id_type!(i64, TeamId);
define_id_type!(i64, RequestId);
define_id_type!(i64, AssignmentId);
define_id_type!(i64, WorkLogId);

pub use crate::models::account::{NewUser, Role, User};
pub use crate::models::directory::{
    Company, CompanyDraft, Department, DepartmentDraft, Equipment, EquipmentCategory,
    EquipmentCategoryDraft, EquipmentDraft, MaintenanceTeam, MaintenanceTeamDraft, WorkCenter,
    WorkCenterDraft,
};
pub use crate::models::maintenance::{
    MaintenanceAssignment, MaintenanceRequest, MaintenanceType, NewAssignment,
    NewMaintenanceRequest, NewWorkLog, Priority, RequestDetails, RequestStatus, WorkLog,
    WorkLogStatus,
};
pub use crate::models::window::TimeWindow;
