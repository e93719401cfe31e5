//! List and retrieve shapes: ids resolved into the names and emails clients
//! display.

mod support;

use gearguard::api::{Role, WorkLogStatus};
use gearguard::services::maintenance::{self, AvailabilityQuery, ReassignInput, WorkLogInput};
use gearguard::services::{directory, views};
use support::plant::{slot, Plant};

#[tokio::test]
async fn test_request_views_name_their_references() {
    let plant = Plant::seed().await;
    let user = plant.principal(&plant.user);
    let request = maintenance::create_request(
        plant.repo(),
        &user,
        &plant.details(&plant.tech_a, slot(1), 2),
    )
    .await
    .unwrap();

    let listed = maintenance::list_requests(plant.repo(), &user).await.unwrap();
    let listed = views::request_views(plant.repo(), listed).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].request.id, request.id);
    assert_eq!(listed[0].equipment_name, "Press");
    assert_eq!(listed[0].work_center_name, "Bay one");
    assert_eq!(listed[0].team_name.as_deref(), Some("Line"));
    assert_eq!(listed[0].technician_email.as_deref(), Some("tech.a@acme.test"));

    let single = views::request_view(plant.repo(), request).await.unwrap();
    assert_eq!(single, listed[0]);

    let json = serde_json::to_value(&single).unwrap();
    assert_eq!(json["equipment"], plant.press.id.value());
    assert_eq!(json["equipment_name"], "Press");
    assert_eq!(json["status"], "scheduled");
}

#[tokio::test]
async fn test_request_view_without_team_has_no_team_name() {
    let plant = Plant::seed().await;
    let mut details = plant.details(&plant.tech_a, slot(1), 2);
    details.assigned_team = None;
    let request = maintenance::create_request(plant.repo(), &plant.principal(&plant.user), &details)
        .await
        .unwrap();

    let view = views::request_view(plant.repo(), request).await.unwrap();
    assert_eq!(view.team_name, None);
    assert_eq!(view.technician_email.as_deref(), Some("tech.a@acme.test"));
}

#[tokio::test]
async fn test_work_log_views_carry_technician_email() {
    let plant = Plant::seed().await;
    let request = maintenance::create_request(
        plant.repo(),
        &plant.principal(&plant.user),
        &plant.details(&plant.tech_a, slot(1), 2),
    )
    .await
    .unwrap();
    let tech = plant.principal(&plant.tech_a);
    maintenance::add_work_log(
        plant.repo(),
        &tech,
        &WorkLogInput {
            maintenance_id: Some(request.id),
            note: "Seal ordered".to_string(),
            status: Some(WorkLogStatus::Blocked),
        },
    )
    .await
    .unwrap();

    let logs = maintenance::list_work_logs(plant.repo(), &tech, request.id)
        .await
        .unwrap();
    let logs = views::work_log_views(plant.repo(), logs).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].technician_email, "tech.a@acme.test");
    assert_eq!(logs[0].log.note, "Seal ordered");
}

#[tokio::test]
async fn test_availability_view_lists_technician_and_codes() {
    let plant = Plant::seed().await;
    let query = AvailabilityQuery {
        equipment: Some(plant.press.id),
        maintenance_team: Some(plant.line_team.id),
        scheduled_start: Some(slot(1)),
        duration_hours: Some(2),
    };
    let availability =
        maintenance::check_availability(plant.repo(), &plant.principal(&plant.user), &query)
            .await
            .unwrap();

    let view = views::availability_view(plant.repo(), availability).await.unwrap();
    assert_eq!(view.assigned_technician.id, plant.tech_a.id);
    assert_eq!(view.assigned_technician.email, "tech.a@acme.test");
    let codes: Vec<_> = view
        .available_work_centers
        .iter()
        .map(|c| c.code.as_str())
        .collect();
    assert_eq!(codes, vec!["WC-1", "WC-2"]);
}

#[tokio::test]
async fn test_reassignment_view_names_new_team_and_technician() {
    let plant = Plant::seed().await;
    let request = maintenance::create_request(
        plant.repo(),
        &plant.principal(&plant.user),
        &plant.details(&plant.tech_a, slot(1), 2),
    )
    .await
    .unwrap();
    let moved = maintenance::reassign(
        plant.repo(),
        &plant.principal(&plant.tech_a),
        &ReassignInput {
            maintenance_id: Some(request.id),
            new_team: Some(plant.backup_team.id),
            reason: "Needs a second pair of hands".to_string(),
        },
    )
    .await
    .unwrap();

    let view = views::reassignment_view(plant.repo(), moved).await.unwrap();
    assert_eq!(view.new_technician_email, "tech.c@acme.test");
    assert_eq!(view.new_team_name, "Backup");
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["message"], "Maintenance reassigned successfully.");
    assert_eq!(json["new_technician"], plant.tech_c.id.value());
}

#[tokio::test]
async fn test_equipment_view_nests_details() {
    let plant = Plant::seed().await;
    let admin = plant.principal(&plant.admin);

    let press = directory::get_equipment(plant.repo(), &admin, plant.press.id)
        .await
        .unwrap();
    let view = views::equipment_view(plant.repo(), press).await.unwrap();
    assert_eq!(view.company.name, "Acme Works");
    assert_eq!(view.company.location, "Pune");
    assert_eq!(view.category.name, "Hydraulics");
    let employee = view.employee.unwrap();
    assert_eq!(employee.email, "user@acme.test");
    assert_eq!(employee.role, Role::User);
    assert_eq!(view.department, None);

    let all = directory::list_equipment(plant.repo(), &admin).await.unwrap();
    let all = views::equipment_views(plant.repo(), all).await.unwrap();
    let lathe = all.iter().find(|e| e.id == plant.lathe.id).unwrap();
    assert_eq!(lathe.employee, None);
    assert_eq!(lathe.department.as_ref().unwrap().name, "Logistics");
}

#[tokio::test]
async fn test_category_view_details_default_technician() {
    let plant = Plant::seed().await;
    let categories = directory::list_categories(plant.repo()).await.unwrap();
    let categories = views::category_views(plant.repo(), categories).await.unwrap();

    let detail = categories[0].default_technician_detail.as_ref().unwrap();
    assert_eq!(detail.id, plant.tech_a.id);
    assert_eq!(detail.email, "tech.a@acme.test");
    assert_eq!(detail.role, Role::Technician);
}

#[tokio::test]
async fn test_select_options_carry_company_details() {
    let plant = Plant::seed().await;
    let user = plant.principal(&plant.user);

    let equipment = directory::equipment_options(plant.repo(), &user).await.unwrap();
    assert_eq!(equipment.len(), 1);
    assert_eq!(equipment[0].serial_number, "SN-PRESS");
    assert_eq!(equipment[0].company.name, "Acme Works");
    assert_eq!(equipment[0].category.name, "Hydraulics");

    let centers = directory::work_center_options(plant.repo(), &user).await.unwrap();
    assert_eq!(centers.len(), 2);
    assert!(centers.iter().all(|c| c.company_id == plant.company.id));
    assert_eq!(centers[0].company_name, "Acme Works");
    assert_eq!(centers[0].company_location, "Pune");
}
