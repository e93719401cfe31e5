//! Reference-data rules: admin-only writes, role-filtered reads, select views.

mod support;

use rust_decimal::Decimal;

use gearguard::api::{
    CompanyDraft, EquipmentCategoryDraft, MaintenanceTeamDraft, UserId, WorkCenterDraft,
    WorkCenterId,
};
use gearguard::services::directory;
use gearguard::services::ServiceError;
use support::plant::Plant;

fn centre(code: &str, plant: &Plant, alternates: Vec<WorkCenterId>) -> WorkCenterDraft {
    WorkCenterDraft {
        name: format!("Centre {}", code),
        code: code.to_string(),
        company: plant.company.id,
        tag: "paint".to_string(),
        alternative_work_centers: alternates,
        cost_per_hour: Decimal::new(1200, 2),
        capacity: 2,
        time_efficiency: Decimal::new(100, 0),
        oee_target: Decimal::new(80, 0),
    }
}

#[tokio::test]
async fn test_only_admins_write_reference_data() {
    let plant = Plant::seed().await;
    let draft = CompanyDraft {
        name: "Initech".to_string(),
        location: String::new(),
    };

    for role_holder in [&plant.user, &plant.tech_a] {
        let err = directory::create_company(plant.repo(), &plant.principal(role_holder), &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    let created = directory::create_company(plant.repo(), &plant.principal(&plant.admin), &draft)
        .await
        .unwrap();
    assert_eq!(created.name, "Initech");
}

#[tokio::test]
async fn test_blank_company_name_is_invalid() {
    let plant = Plant::seed().await;
    let draft = CompanyDraft {
        name: "  ".to_string(),
        location: String::new(),
    };
    let err = directory::create_company(plant.repo(), &plant.principal(&plant.admin), &draft)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_company_in_use_cannot_be_deleted() {
    let plant = Plant::seed().await;
    let admin = plant.principal(&plant.admin);
    let err = directory::delete_company(plant.repo(), &admin, plant.company.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(directory::get_company(plant.repo(), plant.company.id).await.is_ok());
}

#[tokio::test]
async fn test_equipment_visibility_by_role() {
    let plant = Plant::seed().await;

    let for_user = directory::list_equipment(plant.repo(), &plant.principal(&plant.user))
        .await
        .unwrap();
    assert_eq!(for_user.len(), 1);
    assert_eq!(for_user[0].id, plant.press.id);

    let for_admin = directory::list_equipment(plant.repo(), &plant.principal(&plant.admin))
        .await
        .unwrap();
    assert_eq!(for_admin.len(), 3);

    let err = directory::get_equipment(plant.repo(), &plant.principal(&plant.user), plant.lathe.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_equipment_select_is_scoped_even_for_admins() {
    let plant = Plant::seed().await;
    let options = directory::equipment_options(plant.repo(), &plant.principal(&plant.admin))
        .await
        .unwrap();
    assert!(options.is_empty());

    let options = directory::equipment_options(plant.repo(), &plant.principal(&plant.user))
        .await
        .unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].name, "Press");
}

#[tokio::test]
async fn test_work_centers_are_company_scoped() {
    let plant = Plant::seed().await;

    let for_user = directory::list_work_centers(plant.repo(), &plant.principal(&plant.user))
        .await
        .unwrap();
    assert_eq!(for_user.len(), 2);
    assert!(for_user.iter().all(|c| c.company == plant.company.id));

    let for_admin = directory::list_work_centers(plant.repo(), &plant.principal(&plant.admin))
        .await
        .unwrap();
    assert_eq!(for_admin.len(), 3);

    let options = directory::work_center_options(plant.repo(), &plant.principal(&plant.admin))
        .await
        .unwrap();
    assert_eq!(options.len(), 2);

    let err = directory::get_work_center(
        plant.repo(),
        &plant.principal(&plant.user),
        plant.foreign_bay.id,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_alternate_work_centers_are_linked_both_ways() {
    let plant = Plant::seed().await;
    let admin = plant.principal(&plant.admin);

    let paint = directory::create_work_center(
        plant.repo(),
        &admin,
        &centre("PT-1", &plant, vec![plant.bay_one.id]),
    )
    .await
    .unwrap();
    assert_eq!(paint.alternative_work_centers, vec![plant.bay_one.id]);

    let bay_one = directory::get_work_center(plant.repo(), &admin, plant.bay_one.id)
        .await
        .unwrap();
    assert!(bay_one.alternative_work_centers.contains(&paint.id));

    directory::delete_work_center(plant.repo(), &admin, paint.id)
        .await
        .unwrap();
    let bay_one = directory::get_work_center(plant.repo(), &admin, plant.bay_one.id)
        .await
        .unwrap();
    assert!(bay_one.alternative_work_centers.is_empty());
}

#[tokio::test]
async fn test_invalid_work_center_percentages_are_rejected() {
    let plant = Plant::seed().await;
    let mut draft = centre("PT-2", &plant, vec![]);
    draft.oee_target = Decimal::new(101, 0);

    let err = directory::create_work_center(plant.repo(), &plant.principal(&plant.admin), &draft)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("oee_target")));
}

#[tokio::test]
async fn test_team_members_must_be_technicians() {
    let plant = Plant::seed().await;
    let admin = plant.principal(&plant.admin);

    let err = directory::create_team(
        plant.repo(),
        &admin,
        &MaintenanceTeamDraft {
            name: "Mixed".to_string(),
            company: plant.company.id,
            members: vec![plant.tech_a.id, plant.user.id],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("not a technician")));

    let err = directory::create_team(
        plant.repo(),
        &admin,
        &MaintenanceTeamDraft {
            name: "Ghosts".to_string(),
            company: plant.company.id,
            members: vec![UserId::new(999)],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("does not exist")));
}

#[tokio::test]
async fn test_team_membership_keeps_order_without_duplicates() {
    let plant = Plant::seed().await;
    let team = directory::create_team(
        plant.repo(),
        &plant.principal(&plant.admin),
        &MaintenanceTeamDraft {
            name: "Night shift".to_string(),
            company: plant.company.id,
            members: vec![plant.tech_c.id, plant.tech_a.id, plant.tech_c.id],
        },
    )
    .await
    .unwrap();
    assert_eq!(team.members, vec![plant.tech_c.id, plant.tech_a.id]);
}

#[tokio::test]
async fn test_teams_of_other_companies_are_hidden() {
    let plant = Plant::seed().await;
    let admin = plant.principal(&plant.admin);
    let foreign = directory::create_team(
        plant.repo(),
        &admin,
        &MaintenanceTeamDraft {
            name: "Globex crew".to_string(),
            company: plant.other_company.id,
            members: vec![],
        },
    )
    .await
    .unwrap();

    let visible = directory::list_teams(plant.repo(), &plant.principal(&plant.tech_a))
        .await
        .unwrap();
    assert_eq!(visible.len(), 2);
    assert!(directory::get_team(plant.repo(), &plant.principal(&plant.tech_a), foreign.id)
        .await
        .is_err());
    assert_eq!(
        directory::list_teams(plant.repo(), &admin).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_category_default_technician_must_be_a_technician() {
    let plant = Plant::seed().await;
    let err = directory::create_category(
        plant.repo(),
        &plant.principal(&plant.admin),
        &EquipmentCategoryDraft {
            name: "Electrical".to_string(),
            default_technician: Some(plant.user.id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_public_select_views() {
    let plant = Plant::seed().await;
    let companies = directory::company_options(plant.repo()).await.unwrap();
    let names: Vec<_> = companies.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Acme Works", "Globex"]);

    let departments = directory::department_options(plant.repo()).await.unwrap();
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[0].id, plant.department.id);
}
