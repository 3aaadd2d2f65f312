//! Service-level behaviour over an in-memory mock repository.

mod common;

use std::sync::Arc;

use common::{sample_user, service_over, MockUsersRepository};
use users::contract::model::{NewUser, UserPatch};
use users::domain::error::DomainError;

#[tokio::test]
async fn list_on_empty_repository_is_empty() {
    let svc = service_over(Arc::new(MockUsersRepository::new()));
    let users = svc.list_users().await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn create_returns_the_stored_record() {
    let svc = service_over(Arc::new(MockUsersRepository::new()));

    let created = svc
        .create_user(NewUser {
            email: "a@x.com".into(),
            email_visibility: false,
            name: "A".into(),
        })
        .await
        .unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.email, "a@x.com");

    let fetched = svc.get_user_by_email("a@x.com").await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_with_taken_email_is_a_storage_error() {
    let repo = Arc::new(MockUsersRepository::with_users(vec![sample_user(
        "r1", "a@x.com", "A",
    )]));
    let svc = service_over(repo);

    let err = svc
        .create_user(NewUser {
            email: "a@x.com".into(),
            ..NewUser::default()
        })
        .await
        .unwrap_err();
    match err {
        DomainError::Storage { operation, message } => {
            assert_eq!(operation, "creating new user");
            assert!(message.contains("UNIQUE"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_patch_never_reaches_storage() {
    let repo = Arc::new(MockUsersRepository::with_users(vec![sample_user(
        "r1", "a@x.com", "A",
    )]));
    let svc = service_over(repo.clone());

    let err = svc
        .update_user_by_id("r1", UserPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::EmptyUpdate));
    assert_eq!(repo.update_calls(), 0);
    assert_eq!(svc.get_user_by_id("r1").await.unwrap().name, "A");
}

#[tokio::test]
async fn update_changes_only_present_fields() {
    let mut user = sample_user("r1", "a@x.com", "A");
    user.email_visibility = true;
    let svc = service_over(Arc::new(MockUsersRepository::with_users(vec![user])));

    let updated = svc
        .update_user_by_id(
            "r1",
            UserPatch {
                name: Some("B".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "B");
    assert_eq!(updated.email, "a@x.com");
    assert!(updated.email_visibility);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let svc = service_over(Arc::new(MockUsersRepository::new()));

    let err = svc
        .update_user_by_id(
            "missing",
            UserPatch {
                name: Some("B".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn blank_id_is_rejected() {
    let svc = service_over(Arc::new(MockUsersRepository::new()));

    assert!(matches!(
        svc.get_user_by_id("").await.unwrap_err(),
        DomainError::MissingId
    ));
    assert!(matches!(
        svc.delete_user_by_id(" ").await.unwrap_err(),
        DomainError::MissingId
    ));
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let svc = service_over(Arc::new(MockUsersRepository::with_users(vec![sample_user(
        "r1", "a@x.com", "A",
    )])));

    assert!(svc.delete_user_by_id("r1").await.unwrap());
    assert!(svc.get_user_by_id("r1").await.unwrap_err().is_not_found());
}

/// Deleting an id that does not exist is accepted; the caller only learns
/// that nothing was removed.
#[tokio::test]
async fn delete_of_unknown_id_succeeds_without_removing_anything() {
    let repo = Arc::new(MockUsersRepository::with_users(vec![sample_user(
        "r1", "a@x.com", "A",
    )]));
    let svc = service_over(repo.clone());

    let removed = svc.delete_user_by_id("nope").await.unwrap();
    assert!(!removed);
    assert_eq!(repo.snapshot().len(), 1);
}

#[tokio::test]
async fn create_whose_row_disappears_before_read_back_is_not_found() {
    let repo = Arc::new(MockUsersRepository::vanishing_inserts());
    let svc = service_over(repo.clone());

    let err = svc
        .create_user(NewUser {
            email: "gone@x.com".into(),
            name: "Gone".into(),
            ..NewUser::default()
        })
        .await
        .unwrap_err();
    match err {
        DomainError::NotFound { field, value } => {
            assert_eq!(field, "email");
            assert_eq!(value, "gone@x.com");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(repo.snapshot().is_empty());
}

#[tokio::test]
async fn storage_failures_carry_operation_context() {
    let svc = service_over(Arc::new(MockUsersRepository::failing("database is locked")));

    let err = svc.list_users().await.unwrap_err();
    assert_eq!(err.to_string(), "getting users: database is locked");
}
