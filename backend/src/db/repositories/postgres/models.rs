use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::{
    companies, departments, equipment, equipment_categories, maintenance_assignments,
    maintenance_requests, maintenance_teams, maintenance_work_logs, team_members, users,
    work_center_alternates, work_centers,
};

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
}

// =============================================================================
// Directory
// =============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CompanyRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = companies)]
pub struct CompanyChanges {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DepartmentRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = departments)]
pub struct DepartmentChanges {
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = equipment_categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub default_technician_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = equipment_categories)]
#[diesel(treat_none_as_null = true)]
pub struct CategoryChanges {
    pub name: String,
    pub default_technician_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = equipment)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EquipmentRow {
    pub id: i64,
    pub name: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiration: Option<NaiveDate>,
    pub last_maintenance_service_date: Option<NaiveDate>,
    pub maintenance_interval_days: Option<i32>,
    pub company_id: i64,
    pub category_id: i64,
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = equipment)]
#[diesel(treat_none_as_null = true)]
pub struct EquipmentChanges {
    pub name: String,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiration: Option<NaiveDate>,
    pub last_maintenance_service_date: Option<NaiveDate>,
    pub maintenance_interval_days: Option<i32>,
    pub company_id: i64,
    pub category_id: i64,
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = work_centers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkCenterRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub company_id: i64,
    pub tag: String,
    pub cost_per_hour: Decimal,
    pub capacity: i32,
    pub time_efficiency: Decimal,
    pub oee_target: Decimal,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = work_centers)]
pub struct WorkCenterChanges {
    pub name: String,
    pub code: String,
    pub company_id: i64,
    pub tag: String,
    pub cost_per_hour: Decimal,
    pub capacity: i32,
    pub time_efficiency: Decimal,
    pub oee_target: Decimal,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = work_center_alternates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AlternateRow {
    pub work_center_id: i64,
    pub alternate_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = maintenance_teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub company_id: i64,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = maintenance_teams)]
pub struct TeamChanges {
    pub name: String,
    pub company_id: i64,
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = team_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamMemberRow {
    pub team_id: i64,
    pub user_id: i64,
    pub position: i32,
}

// =============================================================================
// Maintenance
// =============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = maintenance_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RequestRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub maintenance_type: String,
    pub priority: String,
    pub status: String,
    pub equipment_id: i64,
    pub work_center_id: i64,
    pub company_id: i64,
    pub department_id: Option<i64>,
    pub created_by_id: i64,
    pub assigned_team_id: Option<i64>,
    pub assigned_technician_id: Option<i64>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub duration_hours: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maintenance_requests)]
pub struct NewRequestRow {
    pub title: String,
    pub description: String,
    pub maintenance_type: String,
    pub priority: String,
    pub status: String,
    pub equipment_id: i64,
    pub work_center_id: i64,
    pub company_id: i64,
    pub department_id: Option<i64>,
    pub created_by_id: i64,
    pub assigned_team_id: Option<i64>,
    pub assigned_technician_id: Option<i64>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub duration_hours: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a stored request may change after creation.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = maintenance_requests)]
#[diesel(treat_none_as_null = true)]
pub struct RequestChanges {
    pub title: String,
    pub description: String,
    pub maintenance_type: String,
    pub priority: String,
    pub status: String,
    pub equipment_id: i64,
    pub work_center_id: i64,
    pub assigned_team_id: Option<i64>,
    pub assigned_technician_id: Option<i64>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub duration_hours: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = maintenance_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    pub id: i64,
    pub maintenance_request_id: i64,
    pub assigned_team_id: Option<i64>,
    pub assigned_technician_id: Option<i64>,
    pub assigned_by_id: Option<i64>,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maintenance_assignments)]
pub struct NewAssignmentRow {
    pub maintenance_request_id: i64,
    pub assigned_team_id: Option<i64>,
    pub assigned_technician_id: Option<i64>,
    pub assigned_by_id: Option<i64>,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = maintenance_work_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkLogRow {
    pub id: i64,
    pub maintenance_request_id: i64,
    pub technician_id: i64,
    pub note: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = maintenance_work_logs)]
pub struct NewWorkLogRow {
    pub maintenance_request_id: i64,
    pub technician_id: i64,
    pub note: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
