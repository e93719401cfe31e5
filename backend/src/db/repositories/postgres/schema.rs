// Mirrors migrations/2026-01-05-000000_init/up.sql.

diesel::table! {
    companies (id) {
        id -> Int8,
        name -> Text,
        location -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    departments (id) {
        id -> Int8,
        name -> Text,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        email -> Text,
        password_hash -> Text,
        role -> Text,
        company_id -> Nullable<Int8>,
        department_id -> Nullable<Int8>,
    }
}

diesel::table! {
    equipment_categories (id) {
        id -> Int8,
        name -> Text,
        default_technician_id -> Nullable<Int8>,
    }
}

diesel::table! {
    equipment (id) {
        id -> Int8,
        name -> Text,
        serial_number -> Text,
        purchase_date -> Nullable<Date>,
        warranty_expiration -> Nullable<Date>,
        last_maintenance_service_date -> Nullable<Date>,
        maintenance_interval_days -> Nullable<Int4>,
        company_id -> Int8,
        category_id -> Int8,
        employee_id -> Nullable<Int8>,
        department_id -> Nullable<Int8>,
    }
}

diesel::table! {
    work_centers (id) {
        id -> Int8,
        name -> Text,
        code -> Text,
        company_id -> Int8,
        tag -> Text,
        cost_per_hour -> Numeric,
        capacity -> Int4,
        time_efficiency -> Numeric,
        oee_target -> Numeric,
    }
}

diesel::table! {
    work_center_alternates (work_center_id, alternate_id) {
        work_center_id -> Int8,
        alternate_id -> Int8,
    }
}

diesel::table! {
    maintenance_teams (id) {
        id -> Int8,
        name -> Text,
        company_id -> Int8,
    }
}

diesel::table! {
    team_members (team_id, user_id) {
        team_id -> Int8,
        user_id -> Int8,
        position -> Int4,
    }
}

diesel::table! {
    maintenance_requests (id) {
        id -> Int8,
        title -> Text,
        description -> Text,
        maintenance_type -> Text,
        priority -> Text,
        status -> Text,
        equipment_id -> Int8,
        work_center_id -> Int8,
        company_id -> Int8,
        department_id -> Nullable<Int8>,
        created_by_id -> Int8,
        assigned_team_id -> Nullable<Int8>,
        assigned_technician_id -> Nullable<Int8>,
        scheduled_start -> Nullable<Timestamptz>,
        duration_hours -> Nullable<Int4>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    maintenance_assignments (id) {
        id -> Int8,
        maintenance_request_id -> Int8,
        assigned_team_id -> Nullable<Int8>,
        assigned_technician_id -> Nullable<Int8>,
        assigned_by_id -> Nullable<Int8>,
        assigned_at -> Timestamptz,
        is_active -> Bool,
    }
}

diesel::table! {
    maintenance_work_logs (id) {
        id -> Int8,
        maintenance_request_id -> Int8,
        technician_id -> Int8,
        note -> Text,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(users -> companies (company_id));
diesel::joinable!(users -> departments (department_id));
diesel::joinable!(equipment -> companies (company_id));
diesel::joinable!(equipment -> equipment_categories (category_id));
diesel::joinable!(work_centers -> companies (company_id));
diesel::joinable!(maintenance_teams -> companies (company_id));
diesel::joinable!(team_members -> maintenance_teams (team_id));
diesel::joinable!(team_members -> users (user_id));
diesel::joinable!(maintenance_requests -> equipment (equipment_id));
diesel::joinable!(maintenance_requests -> work_centers (work_center_id));
diesel::joinable!(maintenance_assignments -> maintenance_requests (maintenance_request_id));
diesel::joinable!(maintenance_work_logs -> maintenance_requests (maintenance_request_id));

diesel::allow_tables_to_appear_in_same_query!(
    companies,
    departments,
    users,
    equipment_categories,
    equipment,
    work_centers,
    work_center_alternates,
    maintenance_teams,
    team_members,
    maintenance_requests,
    maintenance_assignments,
    maintenance_work_logs,
);
