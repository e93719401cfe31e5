//! Tests for db::factory module - repository creation and configuration.

mod support;

use std::io::Write;
use std::str::FromStr;

use gearguard::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use gearguard::db::repository::AccountRepository;

#[test]
fn test_repository_type_from_str_postgres() {
    for name in ["postgres", "POSTGRES", "pg"] {
        assert_eq!(RepositoryType::from_str(name).unwrap(), RepositoryType::Postgres);
    }
}

#[test]
fn test_repository_type_from_str_local() {
    for name in ["local", "LOCAL", "memory"] {
        assert_eq!(RepositoryType::from_str(name).unwrap(), RepositoryType::Local);
    }
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("sqlite");
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/gearguard")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_pg_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/gearguard")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_explicit_repository_type_wins_over_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", Some("postgres://localhost/gearguard")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_invalid_defaults_to_local() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("invalid")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[tokio::test]
async fn test_create_local_via_factory_is_healthy() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .ok()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(result
        .err()
        .unwrap()
        .to_string()
        .contains("requires PostgresConfig"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(result
        .err()
        .unwrap()
        .to_string()
        .contains("feature not enabled"));
}

#[tokio::test]
async fn test_from_config_file_local() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"local\"").unwrap();

    let repo = RepositoryFactory::from_config_file(file.path())
        .await
        .ok()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_from_config_file_missing_file_fails() {
    let result = RepositoryFactory::from_config_file("/nonexistent/gearguard.toml").await;
    assert!(result
        .err()
        .unwrap()
        .to_string()
        .contains("Failed to read config file"));
}

#[tokio::test]
async fn test_from_config_file_postgres_without_url_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[repository]\ntype = \"postgres\"").unwrap();

    let result = RepositoryFactory::from_config_file(file.path()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_builder_with_explicit_local_type() {
    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Local)
        .build()
        .await
        .ok()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_init_repository_returns_independent_stores() {
    use gearguard::api::{NewUser, Role};
    use gearguard::db::{init_repository, RepositoryConfig};

    let config = RepositoryConfig::default();
    let first = init_repository(&config).await.unwrap();
    let second = init_repository(&config).await.unwrap();
    assert!(first.health_check().await.unwrap());

    first
        .create_user(&NewUser {
            email: "only.here@acme.test".to_string(),
            password_hash: "salt$digest".to_string(),
            role: Role::User,
            company: None,
            department: None,
        })
        .await
        .unwrap();

    assert!(first
        .find_user_by_email("only.here@acme.test")
        .await
        .unwrap()
        .is_some());
    assert!(second
        .find_user_by_email("only.here@acme.test")
        .await
        .unwrap()
        .is_none());
}
