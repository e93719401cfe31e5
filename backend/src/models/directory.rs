//! Reference (directory) data: companies, departments, equipment and the
//! places and teams that maintain it.
//!
//! Every entity comes with a `*Draft` carrying its writable fields. Drafts
//! are what clients send on create and full update; the repository assigns
//! ids and timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{CategoryId, CompanyId, DepartmentId, EquipmentId, TeamId, UserId, WorkCenterId};

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required.", field));
    }
    Ok(())
}

fn require_percent(field: &str, value: Decimal) -> Result<(), String> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(format!("{} must be between 0 and 100.", field));
    }
    Ok(())
}

// =============================================================================
// Company / Department
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub location: String,
}

impl CompanyDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentDraft {
    pub name: String,
}

impl DepartmentDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)
    }
}

// =============================================================================
// Equipment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub id: CategoryId,
    pub name: String,
    pub default_technician: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCategoryDraft {
    pub name: String,
    #[serde(default)]
    pub default_technician: Option<UserId>,
}

impl EquipmentCategoryDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiration: Option<NaiveDate>,
    pub last_maintenance_service_date: Option<NaiveDate>,
    pub maintenance_interval_days: Option<u32>,
    pub company: CompanyId,
    pub category: CategoryId,
    /// Owning employee.
    pub employee: Option<UserId>,
    pub department: Option<DepartmentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDraft {
    pub name: String,
    pub serial_number: String,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_expiration: Option<NaiveDate>,
    #[serde(default)]
    pub last_maintenance_service_date: Option<NaiveDate>,
    #[serde(default)]
    pub maintenance_interval_days: Option<u32>,
    pub company: CompanyId,
    pub category: CategoryId,
    #[serde(default)]
    pub employee: Option<UserId>,
    #[serde(default)]
    pub department: Option<DepartmentId>,
}

impl EquipmentDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("serial_number", &self.serial_number)?;
        if let (Some(purchase), Some(warranty)) = (self.purchase_date, self.warranty_expiration) {
            if warranty < purchase {
                return Err("warranty_expiration cannot precede purchase_date.".to_string());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Work centers
// =============================================================================

fn default_capacity() -> u32 {
    1
}

/// Location where maintenance happens, scoped to a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: WorkCenterId,
    pub name: String,
    pub code: String,
    pub company: CompanyId,
    pub tag: String,
    /// Symmetric: if A lists B then B lists A.
    pub alternative_work_centers: Vec<WorkCenterId>,
    pub cost_per_hour: Decimal,
    pub capacity: u32,
    /// Percent.
    pub time_efficiency: Decimal,
    /// Percent.
    pub oee_target: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenterDraft {
    pub name: String,
    pub code: String,
    pub company: CompanyId,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub alternative_work_centers: Vec<WorkCenterId>,
    pub cost_per_hour: Decimal,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    pub time_efficiency: Decimal,
    pub oee_target: Decimal,
}

impl WorkCenterDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("code", &self.code)?;
        if self.cost_per_hour < Decimal::ZERO {
            return Err("cost_per_hour cannot be negative.".to_string());
        }
        if self.capacity == 0 {
            return Err("capacity must be at least 1.".to_string());
        }
        require_percent("time_efficiency", self.time_efficiency)?;
        require_percent("oee_target", self.oee_target)
    }

    /// Alternates without duplicates, keeping first occurrence order.
    pub fn unique_alternates(&self) -> Vec<WorkCenterId> {
        let mut seen = Vec::with_capacity(self.alternative_work_centers.len());
        for id in &self.alternative_work_centers {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

// =============================================================================
// Maintenance teams
// =============================================================================

/// Named pool of technicians used for assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTeam {
    pub id: TeamId,
    pub name: String,
    pub company: CompanyId,
    /// Membership order is the order the picker walks.
    pub members: Vec<UserId>,
}

impl MaintenanceTeam {
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTeamDraft {
    pub name: String,
    pub company: CompanyId,
    #[serde(default)]
    pub members: Vec<UserId>,
}

impl MaintenanceTeamDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)
    }

    /// Members without duplicates, keeping insertion order.
    pub fn unique_members(&self) -> Vec<UserId> {
        let mut seen = Vec::with_capacity(self.members.len());
        for id in &self.members {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}
