//! A seeded plant: two companies, two departments, technicians split over
//! two teams, and equipment placed so that each visibility rule has exactly
//! one row that passes it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use gearguard::api::{
    CategoryId, Company, CompanyDraft, CompanyId, Department, DepartmentDraft, DepartmentId,
    Equipment, EquipmentCategory, EquipmentCategoryDraft, EquipmentDraft, MaintenanceTeam,
    MaintenanceTeamDraft, MaintenanceType, NewUser, Priority, RequestDetails, Role, User,
    WorkCenter, WorkCenterDraft,
};
use gearguard::auth::{hash_password, Principal};
use gearguard::db::{AccountRepository, DirectoryRepository, FullRepository, LocalRepository};

pub const PASSWORD: &str = "correct-horse";

pub struct Plant {
    pub repo: Arc<LocalRepository>,
    pub company: Company,
    pub other_company: Company,
    pub department: Department,
    pub other_department: Department,
    pub admin: User,
    pub tech_a: User,
    pub tech_b: User,
    pub tech_c: User,
    /// Plain user in `department`.
    pub user: User,
    /// Plain user sharing `user`'s department.
    pub colleague: User,
    /// Plain user without a company.
    pub drifter: User,
    pub category: EquipmentCategory,
    /// Owned by `user`, no department.
    pub press: Equipment,
    /// Belongs to `other_department`.
    pub lathe: Equipment,
    /// No owner and no department.
    pub spare: Equipment,
    pub bay_one: WorkCenter,
    pub bay_two: WorkCenter,
    pub foreign_bay: WorkCenter,
    /// `tech_a` then `tech_b`.
    pub line_team: MaintenanceTeam,
    /// `tech_c` only.
    pub backup_team: MaintenanceTeam,
}

/// A start time `days` ahead of now.
pub fn slot(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

async fn account(
    repo: &LocalRepository,
    email: &str,
    role: Role,
    company: Option<CompanyId>,
    department: Option<DepartmentId>,
) -> User {
    repo.create_user(&NewUser {
        email: email.to_string(),
        password_hash: hash_password(PASSWORD),
        role,
        company,
        department,
    })
    .await
    .unwrap()
}

fn bay(name: &str, code: &str, company: CompanyId) -> WorkCenterDraft {
    WorkCenterDraft {
        name: name.to_string(),
        code: code.to_string(),
        company,
        tag: String::new(),
        alternative_work_centers: vec![],
        cost_per_hour: Decimal::new(4500, 2),
        capacity: 1,
        time_efficiency: Decimal::new(95, 0),
        oee_target: Decimal::new(85, 0),
    }
}

fn machine(
    name: &str,
    serial: &str,
    company: CompanyId,
    category: CategoryId,
    employee: Option<&User>,
    department: Option<DepartmentId>,
) -> EquipmentDraft {
    EquipmentDraft {
        name: name.to_string(),
        serial_number: serial.to_string(),
        purchase_date: None,
        warranty_expiration: None,
        last_maintenance_service_date: None,
        maintenance_interval_days: Some(90),
        company,
        category,
        employee: employee.map(|u| u.id),
        department,
    }
}

impl Plant {
    pub async fn seed() -> Self {
        let repo = Arc::new(LocalRepository::new());

        let company = repo
            .create_company(&CompanyDraft {
                name: "Acme Works".to_string(),
                location: "Pune".to_string(),
            })
            .await
            .unwrap();
        let other_company = repo
            .create_company(&CompanyDraft {
                name: "Globex".to_string(),
                location: String::new(),
            })
            .await
            .unwrap();
        let department = repo
            .create_department(&DepartmentDraft {
                name: "Production".to_string(),
            })
            .await
            .unwrap();
        let other_department = repo
            .create_department(&DepartmentDraft {
                name: "Logistics".to_string(),
            })
            .await
            .unwrap();

        let home = Some(company.id);
        let admin = account(&repo, "admin@acme.test", Role::Admin, home, None).await;
        let tech_a = account(&repo, "tech.a@acme.test", Role::Technician, home, None).await;
        let tech_b = account(&repo, "tech.b@acme.test", Role::Technician, home, None).await;
        let tech_c = account(&repo, "tech.c@acme.test", Role::Technician, home, None).await;
        let user = account(&repo, "user@acme.test", Role::User, home, Some(department.id)).await;
        let colleague =
            account(&repo, "colleague@acme.test", Role::User, home, Some(department.id)).await;
        let drifter = account(&repo, "drifter@acme.test", Role::User, None, None).await;

        let category = repo
            .create_category(&EquipmentCategoryDraft {
                name: "Hydraulics".to_string(),
                default_technician: Some(tech_a.id),
            })
            .await
            .unwrap();

        let press = repo
            .create_equipment(&machine(
                "Press",
                "SN-PRESS",
                company.id,
                category.id,
                Some(&user),
                None,
            ))
            .await
            .unwrap();
        let lathe = repo
            .create_equipment(&machine(
                "Lathe",
                "SN-LATHE",
                company.id,
                category.id,
                None,
                Some(other_department.id),
            ))
            .await
            .unwrap();
        let spare = repo
            .create_equipment(&machine(
                "Spare pump",
                "SN-SPARE",
                company.id,
                category.id,
                None,
                None,
            ))
            .await
            .unwrap();

        let bay_one = repo
            .create_work_center(&bay("Bay one", "WC-1", company.id))
            .await
            .unwrap();
        let bay_two = repo
            .create_work_center(&bay("Bay two", "WC-2", company.id))
            .await
            .unwrap();
        let foreign_bay = repo
            .create_work_center(&bay("Globex bay", "GX-1", other_company.id))
            .await
            .unwrap();

        let line_team = repo
            .create_team(&MaintenanceTeamDraft {
                name: "Line".to_string(),
                company: company.id,
                members: vec![tech_a.id, tech_b.id],
            })
            .await
            .unwrap();
        let backup_team = repo
            .create_team(&MaintenanceTeamDraft {
                name: "Backup".to_string(),
                company: company.id,
                members: vec![tech_c.id],
            })
            .await
            .unwrap();

        Self {
            repo,
            company,
            other_company,
            department,
            other_department,
            admin,
            tech_a,
            tech_b,
            tech_c,
            user,
            colleague,
            drifter,
            category,
            press,
            lathe,
            spare,
            bay_one,
            bay_two,
            foreign_bay,
            line_team,
            backup_team,
        }
    }

    pub fn repo(&self) -> &dyn FullRepository {
        self.repo.as_ref()
    }

    pub fn principal(&self, user: &User) -> Principal {
        Principal::from(user)
    }

    /// A valid corrective request on the press in bay one for the line team.
    pub fn details(&self, technician: &User, start: DateTime<Utc>, hours: u32) -> RequestDetails {
        RequestDetails {
            title: "Hydraulic leak".to_string(),
            description: "Oil under the press".to_string(),
            maintenance_type: Some(MaintenanceType::Corrective),
            priority: Priority::Medium,
            equipment: Some(self.press.id),
            work_center: Some(self.bay_one.id),
            assigned_team: Some(self.line_team.id),
            assigned_technician: Some(technician.id),
            scheduled_start: Some(start),
            duration_hours: Some(hours),
        }
    }
}
