//! Tests for db::repository::error module.

use gearguard::db::repository::{ErrorContext, RepositoryError};

#[test]
fn test_error_context_new() {
    let ctx = ErrorContext::new("create_request");
    assert_eq!(ctx.operation, Some("create_request".to_string()));
    assert!(ctx.entity.is_none());
    assert!(ctx.entity_id.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
}

#[test]
fn test_error_context_builders_chain() {
    let ctx = ErrorContext::new("delete_team")
        .with_entity("team")
        .with_entity_id(42)
        .with_details("still referenced")
        .retryable();
    assert_eq!(ctx.entity.as_deref(), Some("team"));
    assert_eq!(ctx.entity_id.as_deref(), Some("42"));
    assert_eq!(ctx.details.as_deref(), Some("still referenced"));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("get_equipment")
        .with_entity("equipment")
        .with_entity_id(7);
    assert_eq!(
        ctx.to_string(),
        "[operation=get_equipment, entity=equipment, id=7]"
    );
}

#[test]
fn test_empty_context_display() {
    assert_eq!(ErrorContext::default().to_string(), "[]");
}

#[test]
fn test_missing_is_not_found_with_context() {
    let err = RepositoryError::missing("get_work_center", "work_center", 3);
    assert!(err.is_not_found());
    assert!(!err.is_validation());
    assert_eq!(err.context().operation.as_deref(), Some("get_work_center"));
    assert_eq!(err.context().entity.as_deref(), Some("work_center"));
    assert_eq!(err.context().entity_id.as_deref(), Some("3"));
}

#[test]
fn test_validation_is_not_retryable() {
    let err = RepositoryError::validation("name is required.");
    assert!(err.is_validation());
    assert!(!err.is_retryable());
    assert_eq!(err.message(), "name is required.");
}

#[test]
fn test_message_strips_context() {
    let err = RepositoryError::validation_with_context(
        "A work center cannot be its own alternate",
        ErrorContext::new("update_work_center").with_entity_id(5),
    );
    assert_eq!(err.message(), "A work center cannot be its own alternate");
    assert!(err.to_string().contains("operation=update_work_center"));
}

#[test]
fn test_connection_errors_are_retryable_query_errors_are_not() {
    assert!(RepositoryError::connection("refused").is_retryable());
    assert!(!RepositoryError::query("syntax error").is_retryable());
}

#[test]
fn test_timeout_is_retryable() {
    assert!(RepositoryError::timeout("pool exhausted").is_retryable());
}

#[test]
fn test_configuration_and_internal_are_not_retryable() {
    assert!(!RepositoryError::configuration("bad url").is_retryable());
    assert!(!RepositoryError::internal("boom").is_retryable());
}

#[test]
fn test_with_operation_replaces_operation() {
    let err = RepositoryError::not_found("gone").with_operation("get_request");
    assert_eq!(err.context().operation.as_deref(), Some("get_request"));
    assert!(err.to_string().starts_with("Not found: gone"));
}
