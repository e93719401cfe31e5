//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against the schema in
//! `migrations/`. Enumerations are stored as their lowercase text names,
//! unsigned counters as `INTEGER`, money and percentages as `NUMERIC`.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Multi-row writes in a single transaction
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::{
    AssignmentId, CategoryId, Company, CompanyDraft, CompanyId, Department, DepartmentDraft,
    DepartmentId, Equipment, EquipmentCategory, EquipmentCategoryDraft, EquipmentDraft,
    EquipmentId, MaintenanceAssignment, MaintenanceRequest, MaintenanceTeam, MaintenanceTeamDraft,
    NewAssignment, NewMaintenanceRequest, NewUser, NewWorkLog, RequestId, RequestStatus, TeamId,
    TimeWindow, User, UserId, WorkCenter, WorkCenterDraft, WorkCenterId, WorkLog, WorkLogId,
};
use crate::db::repository::{
    AccountRepository, DirectoryRepository, ErrorContext, MaintenanceRepository, RepositoryError,
    RepositoryResult,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    ///
    /// Performs a simple query to verify connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}

// =============================================================================
// Row conversion
// =============================================================================

fn choice<T: FromStr<Err = String>>(value: &str, column: &str) -> RepositoryResult<T> {
    value.parse::<T>().map_err(|bad| {
        RepositoryError::internal_with_context(
            format!("Unexpected value '{}' in column {}", bad, column),
            ErrorContext::new("decode_row").with_details(column),
        )
    })
}

fn to_u32(value: i32, column: &str) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::internal_with_context(
            format!("Negative value {} in column {}", value, column),
            ErrorContext::new("decode_row").with_details(column),
        )
    })
}

fn to_i32(value: u32, field: &str) -> RepositoryResult<i32> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::validation(format!("{} is out of range.", field)))
}

/// Escape `LIKE` wildcards so that an email is matched literally.
fn like_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn user_from_row(row: UserRow) -> RepositoryResult<User> {
    Ok(User {
        id: UserId::new(row.id),
        email: row.email,
        password_hash: row.password_hash,
        role: choice(&row.role, "users.role")?,
        company: row.company_id.map(CompanyId::new),
        department: row.department_id.map(DepartmentId::new),
    })
}

fn company_from_row(row: CompanyRow) -> Company {
    Company {
        id: CompanyId::new(row.id),
        name: row.name,
        location: row.location,
        created_at: row.created_at,
    }
}

fn department_from_row(row: DepartmentRow) -> Department {
    Department {
        id: DepartmentId::new(row.id),
        name: row.name,
    }
}

fn category_from_row(row: CategoryRow) -> EquipmentCategory {
    EquipmentCategory {
        id: CategoryId::new(row.id),
        name: row.name,
        default_technician: row.default_technician_id.map(UserId::new),
    }
}

fn equipment_from_row(row: EquipmentRow) -> RepositoryResult<Equipment> {
    Ok(Equipment {
        id: EquipmentId::new(row.id),
        name: row.name,
        serial_number: row.serial_number,
        purchase_date: row.purchase_date,
        warranty_expiration: row.warranty_expiration,
        last_maintenance_service_date: row.last_maintenance_service_date,
        maintenance_interval_days: row
            .maintenance_interval_days
            .map(|days| to_u32(days, "equipment.maintenance_interval_days"))
            .transpose()?,
        company: CompanyId::new(row.company_id),
        category: CategoryId::new(row.category_id),
        employee: row.employee_id.map(UserId::new),
        department: row.department_id.map(DepartmentId::new),
    })
}

fn equipment_changes(draft: &EquipmentDraft) -> RepositoryResult<EquipmentChanges> {
    Ok(EquipmentChanges {
        name: draft.name.clone(),
        serial_number: draft.serial_number.clone(),
        purchase_date: draft.purchase_date,
        warranty_expiration: draft.warranty_expiration,
        last_maintenance_service_date: draft.last_maintenance_service_date,
        maintenance_interval_days: draft
            .maintenance_interval_days
            .map(|days| to_i32(days, "maintenance_interval_days"))
            .transpose()?,
        company_id: draft.company.value(),
        category_id: draft.category.value(),
        employee_id: draft.employee.map(|id| id.value()),
        department_id: draft.department.map(|id| id.value()),
    })
}

fn work_center_from_row(
    row: WorkCenterRow,
    alternates: Vec<WorkCenterId>,
) -> RepositoryResult<WorkCenter> {
    Ok(WorkCenter {
        id: WorkCenterId::new(row.id),
        name: row.name,
        code: row.code,
        company: CompanyId::new(row.company_id),
        tag: row.tag,
        alternative_work_centers: alternates,
        cost_per_hour: row.cost_per_hour,
        capacity: to_u32(row.capacity, "work_centers.capacity")?,
        time_efficiency: row.time_efficiency,
        oee_target: row.oee_target,
    })
}

fn work_center_changes(draft: &WorkCenterDraft) -> RepositoryResult<WorkCenterChanges> {
    Ok(WorkCenterChanges {
        name: draft.name.clone(),
        code: draft.code.clone(),
        company_id: draft.company.value(),
        tag: draft.tag.clone(),
        cost_per_hour: draft.cost_per_hour,
        capacity: to_i32(draft.capacity, "capacity")?,
        time_efficiency: draft.time_efficiency,
        oee_target: draft.oee_target,
    })
}

fn team_from_row(row: TeamRow, members: Vec<UserId>) -> MaintenanceTeam {
    MaintenanceTeam {
        id: TeamId::new(row.id),
        name: row.name,
        company: CompanyId::new(row.company_id),
        members,
    }
}

fn request_from_row(row: RequestRow) -> RepositoryResult<MaintenanceRequest> {
    Ok(MaintenanceRequest {
        id: RequestId::new(row.id),
        title: row.title,
        description: row.description,
        maintenance_type: choice(&row.maintenance_type, "maintenance_requests.maintenance_type")?,
        priority: choice(&row.priority, "maintenance_requests.priority")?,
        status: choice(&row.status, "maintenance_requests.status")?,
        equipment: EquipmentId::new(row.equipment_id),
        work_center: WorkCenterId::new(row.work_center_id),
        company: CompanyId::new(row.company_id),
        department: row.department_id.map(DepartmentId::new),
        created_by: UserId::new(row.created_by_id),
        assigned_team: row.assigned_team_id.map(TeamId::new),
        assigned_technician: row.assigned_technician_id.map(UserId::new),
        scheduled_start: row.scheduled_start,
        duration_hours: row
            .duration_hours
            .map(|hours| to_u32(hours, "maintenance_requests.duration_hours"))
            .transpose()?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn assignment_from_row(row: AssignmentRow) -> MaintenanceAssignment {
    MaintenanceAssignment {
        id: AssignmentId::new(row.id),
        maintenance_request: RequestId::new(row.maintenance_request_id),
        assigned_team: row.assigned_team_id.map(TeamId::new),
        assigned_technician: row.assigned_technician_id.map(UserId::new),
        assigned_by: row.assigned_by_id.map(UserId::new),
        assigned_at: row.assigned_at,
        is_active: row.is_active,
    }
}

fn new_assignment_row(assignment: &NewAssignment) -> NewAssignmentRow {
    NewAssignmentRow {
        maintenance_request_id: assignment.maintenance_request.value(),
        assigned_team_id: assignment.assigned_team.map(|id| id.value()),
        assigned_technician_id: Some(assignment.assigned_technician.value()),
        assigned_by_id: Some(assignment.assigned_by.value()),
        assigned_at: assignment.assigned_at,
        is_active: true,
    }
}

fn work_log_from_row(row: WorkLogRow) -> RepositoryResult<WorkLog> {
    Ok(WorkLog {
        id: WorkLogId::new(row.id),
        maintenance_request: RequestId::new(row.maintenance_request_id),
        technician: UserId::new(row.technician_id),
        note: row.note,
        status: choice(&row.status, "maintenance_work_logs.status")?,
        created_at: row.created_at,
    })
}

// =============================================================================
// Link tables
// =============================================================================

fn load_alternates(
    conn: &mut PgConnection,
    centers: Vec<i64>,
) -> RepositoryResult<HashMap<i64, Vec<WorkCenterId>>> {
    let rows: Vec<AlternateRow> = work_center_alternates::table
        .filter(work_center_alternates::work_center_id.eq_any(centers))
        .order((
            work_center_alternates::work_center_id,
            work_center_alternates::alternate_id,
        ))
        .select(AlternateRow::as_select())
        .load(conn)?;

    let mut grouped: HashMap<i64, Vec<WorkCenterId>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.work_center_id)
            .or_default()
            .push(WorkCenterId::new(row.alternate_id));
    }
    Ok(grouped)
}

/// Replace the alternates of `owner`, keeping both directions in step.
fn write_alternates(
    conn: &mut PgConnection,
    op: &str,
    owner: i64,
    alternates: &[WorkCenterId],
) -> RepositoryResult<()> {
    if let Some(own) = alternates.iter().find(|alt| alt.value() == owner) {
        return Err(RepositoryError::validation_with_context(
            "A work center cannot be its own alternate",
            ErrorContext::new(op)
                .with_entity("work_center")
                .with_entity_id(own),
        ));
    }

    diesel::delete(
        work_center_alternates::table.filter(
            work_center_alternates::work_center_id
                .eq(owner)
                .or(work_center_alternates::alternate_id.eq(owner)),
        ),
    )
    .execute(conn)?;

    let rows: Vec<AlternateRow> = alternates
        .iter()
        .flat_map(|alt| {
            [
                AlternateRow {
                    work_center_id: owner,
                    alternate_id: alt.value(),
                },
                AlternateRow {
                    work_center_id: alt.value(),
                    alternate_id: owner,
                },
            ]
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(work_center_alternates::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}

fn load_members(
    conn: &mut PgConnection,
    teams: Vec<i64>,
) -> RepositoryResult<HashMap<i64, Vec<UserId>>> {
    let rows: Vec<TeamMemberRow> = team_members::table
        .filter(team_members::team_id.eq_any(teams))
        .order((team_members::team_id, team_members::position))
        .select(TeamMemberRow::as_select())
        .load(conn)?;

    let mut grouped: HashMap<i64, Vec<UserId>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.team_id)
            .or_default()
            .push(UserId::new(row.user_id));
    }
    Ok(grouped)
}

fn write_members(conn: &mut PgConnection, team: i64, members: &[UserId]) -> RepositoryResult<()> {
    diesel::delete(team_members::table.filter(team_members::team_id.eq(team))).execute(conn)?;

    let rows = members
        .iter()
        .enumerate()
        .map(|(position, user)| {
            Ok(TeamMemberRow {
                team_id: team,
                user_id: user.value(),
                position: i32::try_from(position)
                    .map_err(|_| RepositoryError::validation("Too many team members."))?,
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()?;
    if !rows.is_empty() {
        diesel::insert_into(team_members::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn fetch_work_center(
    conn: &mut PgConnection,
    op: &str,
    id: i64,
) -> RepositoryResult<WorkCenter> {
    let row = work_centers::table
        .find(id)
        .select(WorkCenterRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| RepositoryError::missing(op, "work_center", id))?;
    let mut alternates = load_alternates(conn, vec![id])?;
    work_center_from_row(row, alternates.remove(&id).unwrap_or_default())
}

fn fetch_team(conn: &mut PgConnection, op: &str, id: i64) -> RepositoryResult<MaintenanceTeam> {
    let row = maintenance_teams::table
        .find(id)
        .select(TeamRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| RepositoryError::missing(op, "team", id))?;
    let mut members = load_members(conn, vec![id])?;
    Ok(team_from_row(row, members.remove(&id).unwrap_or_default()))
}

fn require_request(conn: &mut PgConnection, op: &str, id: i64) -> RepositoryResult<()> {
    let found: Option<i64> = maintenance_requests::table
        .find(id)
        .select(maintenance_requests::id)
        .first(conn)
        .optional()?;
    found
        .map(|_| ())
        .ok_or_else(|| RepositoryError::missing(op, "maintenance_request", id))
}

fn deleted(op: &str, entity: &str, id: i64, rows: usize) -> RepositoryResult<()> {
    if rows == 0 {
        return Err(RepositoryError::missing(op, entity, id));
    }
    Ok(())
}

// =============================================================================
// AccountRepository
// =============================================================================

#[async_trait]
impl AccountRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = NewUserRow {
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.as_str().to_string(),
            company_id: user.company.map(|id| id.value()),
            department_id: user.department.map(|id| id.value()),
        };
        self.with_conn(move |conn| {
            let stored: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)?;
            user_from_row(stored)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            let row = users::table
                .find(id.value())
                .select(UserRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::missing("get_user", "user", id))?;
            user_from_row(row)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let pattern = like_literal(email);
        self.with_conn(move |conn| {
            users::table
                .filter(users::email.ilike(pattern))
                .select(UserRow::as_select())
                .first(conn)
                .optional()?
                .map(user_from_row)
                .transpose()
        })
        .await
    }
}

// =============================================================================
// DirectoryRepository
// =============================================================================

#[async_trait]
impl DirectoryRepository for PostgresRepository {
    // ==================== Companies ====================

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        self.with_conn(|conn| {
            let rows: Vec<CompanyRow> = companies::table
                .order(companies::id)
                .select(CompanyRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(company_from_row).collect())
        })
        .await
    }

    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company> {
        self.with_conn(move |conn| {
            companies::table
                .find(id.value())
                .select(CompanyRow::as_select())
                .first(conn)
                .optional()?
                .map(company_from_row)
                .ok_or_else(|| RepositoryError::missing("get_company", "company", id))
        })
        .await
    }

    async fn create_company(&self, draft: &CompanyDraft) -> RepositoryResult<Company> {
        let changes = CompanyChanges {
            name: draft.name.clone(),
            location: draft.location.clone(),
        };
        self.with_conn(move |conn| {
            let row: CompanyRow = diesel::insert_into(companies::table)
                .values(&changes)
                .returning(CompanyRow::as_returning())
                .get_result(conn)?;
            Ok(company_from_row(row))
        })
        .await
    }

    async fn update_company(
        &self,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> RepositoryResult<Company> {
        let changes = CompanyChanges {
            name: draft.name.clone(),
            location: draft.location.clone(),
        };
        self.with_conn(move |conn| {
            diesel::update(companies::table.find(id.value()))
                .set(&changes)
                .returning(CompanyRow::as_returning())
                .get_result(conn)
                .optional()?
                .map(company_from_row)
                .ok_or_else(|| RepositoryError::missing("update_company", "company", id))
        })
        .await
    }

    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let rows = diesel::delete(companies::table.find(id.value())).execute(conn)?;
            deleted("delete_company", "company", id.value(), rows)
        })
        .await
    }

    // ==================== Departments ====================

    async fn list_departments(&self) -> RepositoryResult<Vec<Department>> {
        self.with_conn(|conn| {
            let rows: Vec<DepartmentRow> = departments::table
                .order(departments::id)
                .select(DepartmentRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(department_from_row).collect())
        })
        .await
    }

    async fn get_department(&self, id: DepartmentId) -> RepositoryResult<Department> {
        self.with_conn(move |conn| {
            departments::table
                .find(id.value())
                .select(DepartmentRow::as_select())
                .first(conn)
                .optional()?
                .map(department_from_row)
                .ok_or_else(|| RepositoryError::missing("get_department", "department", id))
        })
        .await
    }

    async fn create_department(&self, draft: &DepartmentDraft) -> RepositoryResult<Department> {
        let changes = DepartmentChanges {
            name: draft.name.clone(),
        };
        self.with_conn(move |conn| {
            let row: DepartmentRow = diesel::insert_into(departments::table)
                .values(&changes)
                .returning(DepartmentRow::as_returning())
                .get_result(conn)?;
            Ok(department_from_row(row))
        })
        .await
    }

    async fn update_department(
        &self,
        id: DepartmentId,
        draft: &DepartmentDraft,
    ) -> RepositoryResult<Department> {
        let changes = DepartmentChanges {
            name: draft.name.clone(),
        };
        self.with_conn(move |conn| {
            diesel::update(departments::table.find(id.value()))
                .set(&changes)
                .returning(DepartmentRow::as_returning())
                .get_result(conn)
                .optional()?
                .map(department_from_row)
                .ok_or_else(|| RepositoryError::missing("update_department", "department", id))
        })
        .await
    }

    async fn delete_department(&self, id: DepartmentId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let rows = diesel::delete(departments::table.find(id.value())).execute(conn)?;
            deleted("delete_department", "department", id.value(), rows)
        })
        .await
    }

    // ==================== Equipment categories ====================

    async fn list_categories(&self) -> RepositoryResult<Vec<EquipmentCategory>> {
        self.with_conn(|conn| {
            let rows: Vec<CategoryRow> = equipment_categories::table
                .order(equipment_categories::id)
                .select(CategoryRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(category_from_row).collect())
        })
        .await
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<EquipmentCategory> {
        self.with_conn(move |conn| {
            equipment_categories::table
                .find(id.value())
                .select(CategoryRow::as_select())
                .first(conn)
                .optional()?
                .map(category_from_row)
                .ok_or_else(|| {
                    RepositoryError::missing("get_category", "equipment_category", id)
                })
        })
        .await
    }

    async fn create_category(
        &self,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory> {
        let changes = CategoryChanges {
            name: draft.name.clone(),
            default_technician_id: draft.default_technician.map(|id| id.value()),
        };
        self.with_conn(move |conn| {
            let row: CategoryRow = diesel::insert_into(equipment_categories::table)
                .values(&changes)
                .returning(CategoryRow::as_returning())
                .get_result(conn)?;
            Ok(category_from_row(row))
        })
        .await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &EquipmentCategoryDraft,
    ) -> RepositoryResult<EquipmentCategory> {
        let changes = CategoryChanges {
            name: draft.name.clone(),
            default_technician_id: draft.default_technician.map(|id| id.value()),
        };
        self.with_conn(move |conn| {
            diesel::update(equipment_categories::table.find(id.value()))
                .set(&changes)
                .returning(CategoryRow::as_returning())
                .get_result(conn)
                .optional()?
                .map(category_from_row)
                .ok_or_else(|| {
                    RepositoryError::missing("update_category", "equipment_category", id)
                })
        })
        .await
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let rows =
                diesel::delete(equipment_categories::table.find(id.value())).execute(conn)?;
            deleted("delete_category", "equipment_category", id.value(), rows)
        })
        .await
    }

    // ==================== Equipment ====================

    async fn list_equipment(&self) -> RepositoryResult<Vec<Equipment>> {
        self.with_conn(|conn| {
            let rows: Vec<EquipmentRow> = equipment::table
                .order(equipment::id)
                .select(EquipmentRow::as_select())
                .load(conn)?;
            rows.into_iter().map(equipment_from_row).collect()
        })
        .await
    }

    async fn get_equipment(&self, id: EquipmentId) -> RepositoryResult<Equipment> {
        self.with_conn(move |conn| {
            let row = equipment::table
                .find(id.value())
                .select(EquipmentRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::missing("get_equipment", "equipment", id))?;
            equipment_from_row(row)
        })
        .await
    }

    async fn create_equipment(&self, draft: &EquipmentDraft) -> RepositoryResult<Equipment> {
        let changes = equipment_changes(draft)?;
        self.with_conn(move |conn| {
            let row: EquipmentRow = diesel::insert_into(equipment::table)
                .values(&changes)
                .returning(EquipmentRow::as_returning())
                .get_result(conn)?;
            equipment_from_row(row)
        })
        .await
    }

    async fn update_equipment(
        &self,
        id: EquipmentId,
        draft: &EquipmentDraft,
    ) -> RepositoryResult<Equipment> {
        let changes = equipment_changes(draft)?;
        self.with_conn(move |conn| {
            let row = diesel::update(equipment::table.find(id.value()))
                .set(&changes)
                .returning(EquipmentRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| RepositoryError::missing("update_equipment", "equipment", id))?;
            equipment_from_row(row)
        })
        .await
    }

    async fn delete_equipment(&self, id: EquipmentId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let rows = diesel::delete(equipment::table.find(id.value())).execute(conn)?;
            deleted("delete_equipment", "equipment", id.value(), rows)
        })
        .await
    }

    // ==================== Work centers ====================

    async fn list_work_centers(&self) -> RepositoryResult<Vec<WorkCenter>> {
        self.with_conn(|conn| {
            let rows: Vec<WorkCenterRow> = work_centers::table
                .order(work_centers::id)
                .select(WorkCenterRow::as_select())
                .load(conn)?;
            let mut alternates = load_alternates(conn, rows.iter().map(|r| r.id).collect())?;
            rows.into_iter()
                .map(|row| {
                    let alts = alternates.remove(&row.id).unwrap_or_default();
                    work_center_from_row(row, alts)
                })
                .collect()
        })
        .await
    }

    async fn get_work_center(&self, id: WorkCenterId) -> RepositoryResult<WorkCenter> {
        self.with_conn(move |conn| fetch_work_center(conn, "get_work_center", id.value()))
            .await
    }

    async fn create_work_center(&self, draft: &WorkCenterDraft) -> RepositoryResult<WorkCenter> {
        let changes = work_center_changes(draft)?;
        let alternates = draft.unique_alternates();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row: WorkCenterRow = diesel::insert_into(work_centers::table)
                    .values(&changes)
                    .returning(WorkCenterRow::as_returning())
                    .get_result(tx)?;
                write_alternates(tx, "create_work_center", row.id, &alternates)?;
                fetch_work_center(tx, "create_work_center", row.id)
            })
        })
        .await
    }

    async fn update_work_center(
        &self,
        id: WorkCenterId,
        draft: &WorkCenterDraft,
    ) -> RepositoryResult<WorkCenter> {
        let op = "update_work_center";
        let changes = work_center_changes(draft)?;
        let alternates = draft.unique_alternates();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let updated = diesel::update(work_centers::table.find(id.value()))
                    .set(&changes)
                    .execute(tx)?;
                deleted(op, "work_center", id.value(), updated)?;
                write_alternates(tx, op, id.value(), &alternates)?;
                fetch_work_center(tx, op, id.value())
            })
        })
        .await
    }

    async fn delete_work_center(&self, id: WorkCenterId) -> RepositoryResult<()> {
        // Alternate links cascade in both directions.
        self.with_conn(move |conn| {
            let rows = diesel::delete(work_centers::table.find(id.value())).execute(conn)?;
            deleted("delete_work_center", "work_center", id.value(), rows)
        })
        .await
    }

    // ==================== Teams ====================

    async fn list_teams(&self) -> RepositoryResult<Vec<MaintenanceTeam>> {
        self.with_conn(|conn| {
            let rows: Vec<TeamRow> = maintenance_teams::table
                .order(maintenance_teams::id)
                .select(TeamRow::as_select())
                .load(conn)?;
            let mut members = load_members(conn, rows.iter().map(|r| r.id).collect())?;
            Ok(rows
                .into_iter()
                .map(|row| {
                    let team_members = members.remove(&row.id).unwrap_or_default();
                    team_from_row(row, team_members)
                })
                .collect())
        })
        .await
    }

    async fn get_team(&self, id: TeamId) -> RepositoryResult<MaintenanceTeam> {
        self.with_conn(move |conn| fetch_team(conn, "get_team", id.value()))
            .await
    }

    async fn create_team(&self, draft: &MaintenanceTeamDraft) -> RepositoryResult<MaintenanceTeam> {
        let changes = TeamChanges {
            name: draft.name.clone(),
            company_id: draft.company.value(),
        };
        let members = draft.unique_members();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row: TeamRow = diesel::insert_into(maintenance_teams::table)
                    .values(&changes)
                    .returning(TeamRow::as_returning())
                    .get_result(tx)?;
                write_members(tx, row.id, &members)?;
                Ok(team_from_row(row, members.clone()))
            })
        })
        .await
    }

    async fn update_team(
        &self,
        id: TeamId,
        draft: &MaintenanceTeamDraft,
    ) -> RepositoryResult<MaintenanceTeam> {
        let changes = TeamChanges {
            name: draft.name.clone(),
            company_id: draft.company.value(),
        };
        let members = draft.unique_members();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row = diesel::update(maintenance_teams::table.find(id.value()))
                    .set(&changes)
                    .returning(TeamRow::as_returning())
                    .get_result(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::missing("update_team", "team", id))?;
                write_members(tx, row.id, &members)?;
                Ok(team_from_row(row, members.clone()))
            })
        })
        .await
    }

    async fn delete_team(&self, id: TeamId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let rows = diesel::delete(maintenance_teams::table.find(id.value())).execute(conn)?;
            deleted("delete_team", "team", id.value(), rows)
        })
        .await
    }
}

// =============================================================================
// MaintenanceRepository
// =============================================================================

fn request_changes(request: &MaintenanceRequest) -> RepositoryResult<RequestChanges> {
    Ok(RequestChanges {
        title: request.title.clone(),
        description: request.description.clone(),
        maintenance_type: request.maintenance_type.as_str().to_string(),
        priority: request.priority.as_str().to_string(),
        status: request.status.as_str().to_string(),
        equipment_id: request.equipment.value(),
        work_center_id: request.work_center.value(),
        assigned_team_id: request.assigned_team.map(|id| id.value()),
        assigned_technician_id: request.assigned_technician.map(|id| id.value()),
        scheduled_start: request.scheduled_start,
        duration_hours: request
            .duration_hours
            .map(|hours| to_i32(hours, "duration_hours"))
            .transpose()?,
        updated_at: Utc::now(),
    })
}

#[async_trait]
impl MaintenanceRepository for PostgresRepository {
    async fn create_request(
        &self,
        request: &NewMaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest> {
        let row = NewRequestRow {
            title: request.title.clone(),
            description: request.description.clone(),
            maintenance_type: request.maintenance_type.as_str().to_string(),
            priority: request.priority.as_str().to_string(),
            status: request.status.as_str().to_string(),
            equipment_id: request.equipment.value(),
            work_center_id: request.work_center.value(),
            company_id: request.company.value(),
            department_id: request.department.map(|id| id.value()),
            created_by_id: request.created_by.value(),
            assigned_team_id: request.assigned_team.map(|id| id.value()),
            assigned_technician_id: Some(request.assigned_technician.value()),
            scheduled_start: Some(request.scheduled_start),
            duration_hours: Some(to_i32(request.duration_hours, "duration_hours")?),
            created_at: request.created_at,
            updated_at: request.created_at,
        };
        let assigned_team = request.assigned_team;
        let technician = request.assigned_technician;
        let creator = request.created_by;

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let stored: RequestRow = diesel::insert_into(maintenance_requests::table)
                    .values(&row)
                    .returning(RequestRow::as_returning())
                    .get_result(tx)?;

                let initial = new_assignment_row(&NewAssignment {
                    maintenance_request: RequestId::new(stored.id),
                    assigned_team,
                    assigned_technician: technician,
                    assigned_by: creator,
                    assigned_at: stored.created_at,
                });
                diesel::insert_into(maintenance_assignments::table)
                    .values(&initial)
                    .execute(tx)?;

                request_from_row(stored)
            })
        })
        .await
    }

    async fn get_request(&self, id: RequestId) -> RepositoryResult<MaintenanceRequest> {
        self.with_conn(move |conn| {
            let row = maintenance_requests::table
                .find(id.value())
                .select(RequestRow::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    RepositoryError::missing("get_request", "maintenance_request", id)
                })?;
            request_from_row(row)
        })
        .await
    }

    async fn list_requests(&self) -> RepositoryResult<Vec<MaintenanceRequest>> {
        self.with_conn(|conn| {
            let rows: Vec<RequestRow> = maintenance_requests::table
                .order((
                    maintenance_requests::created_at.desc(),
                    maintenance_requests::id.desc(),
                ))
                .select(RequestRow::as_select())
                .load(conn)?;
            rows.into_iter().map(request_from_row).collect()
        })
        .await
    }

    async fn update_request(
        &self,
        request: &MaintenanceRequest,
    ) -> RepositoryResult<MaintenanceRequest> {
        let id = request.id;
        let changes = request_changes(request)?;
        self.with_conn(move |conn| {
            let row = diesel::update(maintenance_requests::table.find(id.value()))
                .set(&changes)
                .returning(RequestRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| {
                    RepositoryError::missing("update_request", "maintenance_request", id)
                })?;
            request_from_row(row)
        })
        .await
    }

    async fn list_booked_in_window(
        &self,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<MaintenanceRequest>> {
        let (start, end) = (window.start, window.end);
        let booked: Vec<&'static str> = RequestStatus::BOOKED.iter().map(|s| s.as_str()).collect();
        self.with_conn(move |conn| {
            let rows: Vec<RequestRow> = maintenance_requests::table
                .filter(maintenance_requests::status.eq_any(booked))
                .filter(maintenance_requests::scheduled_start.ge(start))
                .filter(maintenance_requests::scheduled_start.lt(end))
                .order(maintenance_requests::id)
                .select(RequestRow::as_select())
                .load(conn)?;
            rows.into_iter().map(request_from_row).collect()
        })
        .await
    }

    async fn record_reassignment(
        &self,
        request: &MaintenanceRequest,
        assignment: &NewAssignment,
    ) -> RepositoryResult<MaintenanceAssignment> {
        let op = "record_reassignment";
        let id = request.id.value();
        let mut changes = request_changes(request)?;
        changes.updated_at = assignment.assigned_at;
        let opened = new_assignment_row(assignment);

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                require_request(tx, op, id)?;

                diesel::update(
                    maintenance_assignments::table
                        .filter(maintenance_assignments::maintenance_request_id.eq(id))
                        .filter(maintenance_assignments::is_active.eq(true)),
                )
                .set(maintenance_assignments::is_active.eq(false))
                .execute(tx)?;

                let row: AssignmentRow = diesel::insert_into(maintenance_assignments::table)
                    .values(&opened)
                    .returning(AssignmentRow::as_returning())
                    .get_result(tx)?;

                diesel::update(maintenance_requests::table.find(id))
                    .set(&changes)
                    .execute(tx)?;

                Ok(assignment_from_row(row))
            })
        })
        .await
    }

    async fn list_assignments(
        &self,
        request: RequestId,
    ) -> RepositoryResult<Vec<MaintenanceAssignment>> {
        self.with_conn(move |conn| {
            let rows: Vec<AssignmentRow> = maintenance_assignments::table
                .filter(maintenance_assignments::maintenance_request_id.eq(request.value()))
                .order((
                    maintenance_assignments::assigned_at.asc(),
                    maintenance_assignments::id.asc(),
                ))
                .select(AssignmentRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(assignment_from_row).collect())
        })
        .await
    }

    async fn record_work_log(
        &self,
        request: &MaintenanceRequest,
        log: &NewWorkLog,
    ) -> RepositoryResult<WorkLog> {
        let op = "record_work_log";
        let id = request.id.value();
        let status = request.status.as_str().to_string();
        let priority = request.priority.as_str().to_string();
        let row = NewWorkLogRow {
            maintenance_request_id: log.maintenance_request.value(),
            technician_id: log.technician.value(),
            note: log.note.clone(),
            status: log.status.as_str().to_string(),
            created_at: log.created_at,
        };

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                require_request(tx, op, id)?;

                let stored: WorkLogRow = diesel::insert_into(maintenance_work_logs::table)
                    .values(&row)
                    .returning(WorkLogRow::as_returning())
                    .get_result(tx)?;

                diesel::update(maintenance_requests::table.find(id))
                    .set((
                        maintenance_requests::status.eq(&status),
                        maintenance_requests::priority.eq(&priority),
                        maintenance_requests::updated_at.eq(stored.created_at),
                    ))
                    .execute(tx)?;

                work_log_from_row(stored)
            })
        })
        .await
    }

    async fn list_work_logs(&self, request: RequestId) -> RepositoryResult<Vec<WorkLog>> {
        self.with_conn(move |conn| {
            let rows: Vec<WorkLogRow> = maintenance_work_logs::table
                .filter(maintenance_work_logs::maintenance_request_id.eq(request.value()))
                .order((
                    maintenance_work_logs::created_at.asc(),
                    maintenance_work_logs::id.asc(),
                ))
                .select(WorkLogRow::as_select())
                .load(conn)?;
            rows.into_iter().map(work_log_from_row).collect()
        })
        .await
    }
}
