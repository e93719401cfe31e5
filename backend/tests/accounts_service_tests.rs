//! Registration, login, refresh and bearer authentication.

mod support;

use chrono::Duration;

use gearguard::api::Role;
use gearguard::auth::{TokenKind, TokenService};
use gearguard::services::accounts::{self, Credentials, Registration};
use gearguard::services::ServiceError;
use support::plant::{Plant, PASSWORD};

fn tokens() -> TokenService {
    TokenService::new("test-secret", Duration::minutes(5), Duration::days(1))
}

fn registration(email: &str, role: Role) -> Registration {
    Registration {
        email: email.to_string(),
        password: "s3cret".to_string(),
        role,
        company: None,
        department: None,
        admin_secret: None,
    }
}

#[tokio::test]
async fn test_register_then_login_then_authenticate() {
    let plant = Plant::seed().await;
    let tokens = tokens();

    let mut new = registration("new.tech@acme.test", Role::Technician);
    new.company = Some(plant.company.id);
    let user = accounts::register(plant.repo(), &new, None).await.unwrap();
    assert_eq!(user.role, Role::Technician);
    assert_ne!(user.password_hash, "s3cret");

    let session = accounts::login(
        plant.repo(),
        &tokens,
        &Credentials {
            email: "NEW.TECH@acme.test".to_string(),
            password: "s3cret".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(session.user.id, user.id);

    let principal = accounts::authenticate(plant.repo(), &tokens, &session.access)
        .await
        .unwrap();
    assert_eq!(principal.user_id, user.id);
    assert_eq!(principal.company, Some(plant.company.id));
    assert!(principal.is_technician());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_case_insensitively() {
    let plant = Plant::seed().await;
    let err = accounts::register(plant.repo(), &registration("USER@acme.test", Role::User), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("already exists")));
}

#[tokio::test]
async fn test_register_requires_email_and_password() {
    let plant = Plant::seed().await;
    let err = accounts::register(plant.repo(), &registration("not-an-email", Role::User), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let mut blank = registration("blank@acme.test", Role::User);
    blank.password.clear();
    let err = accounts::register(plant.repo(), &blank, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_admin_registration_needs_the_configured_secret() {
    let plant = Plant::seed().await;
    let mut admin = registration("boss@acme.test", Role::Admin);
    admin.admin_secret = Some("open-sesame".to_string());

    let err = accounts::register(plant.repo(), &admin, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = accounts::register(plant.repo(), &admin, Some("other"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let user = accounts::register(plant.repo(), &admin, Some("open-sesame"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_login_failures() {
    let plant = Plant::seed().await;
    let tokens = tokens();

    let err = accounts::login(
        plant.repo(),
        &tokens,
        &Credentials {
            email: "user@acme.test".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let err = accounts::login(
        plant.repo(),
        &tokens,
        &Credentials {
            email: "nobody@acme.test".to_string(),
            password: PASSWORD.to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = accounts::login(plant.repo(), &tokens, &Credentials::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_refresh_issues_a_new_access_token() {
    let plant = Plant::seed().await;
    let tokens = tokens();
    let refresh = tokens.issue(&plant.user, TokenKind::Refresh).unwrap();

    let (access, user) = accounts::refresh(plant.repo(), &tokens, Some(&refresh))
        .await
        .unwrap();
    assert_eq!(user.id, plant.user.id);
    let principal = accounts::authenticate(plant.repo(), &tokens, &access)
        .await
        .unwrap();
    assert_eq!(principal.user_id, plant.user.id);
}

#[tokio::test]
async fn test_token_kinds_are_not_interchangeable() {
    let plant = Plant::seed().await;
    let tokens = tokens();
    let access = tokens.issue(&plant.user, TokenKind::Access).unwrap();
    let refresh = tokens.issue(&plant.user, TokenKind::Refresh).unwrap();

    let err = accounts::refresh(plant.repo(), &tokens, Some(&access))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let err = accounts::authenticate(plant.repo(), &tokens, &refresh)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn test_missing_refresh_token_is_invalid_input() {
    let plant = Plant::seed().await;
    let err = accounts::refresh(plant.repo(), &tokens(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_token_signed_with_another_secret_is_rejected() {
    let plant = Plant::seed().await;
    let foreign = TokenService::new("someone-else", Duration::minutes(5), Duration::days(1));
    let access = foreign.issue(&plant.user, TokenKind::Access).unwrap();

    let err = accounts::authenticate(plant.repo(), &tokens(), &access)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}
