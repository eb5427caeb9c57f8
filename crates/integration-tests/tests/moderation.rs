use domains::{DomainError, PageRequest, Role, UserRepository};
use integration_tests::TestApp;

#[tokio::test]
async fn moderator_cannot_touch_admins_but_admin_can() {
    let app = TestApp::spawn().await;
    let (_, moderator) = app.user(Role::Moderator).await;
    let (_, admin) = app.user(Role::Admin).await;
    let (target, _) = app.user(Role::Admin).await;

    let err = app
        .services
        .moderation
        .update_user_role(&moderator, target.id, Role::Reader)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let err = app
        .services
        .moderation
        .delete_user(&moderator, target.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let demoted = app
        .services
        .moderation
        .update_user_role(&admin, target.id, Role::Author)
        .await
        .unwrap();
    assert_eq!(demoted.role, Role::Author);
    app.services.moderation.delete_user(&admin, target.id).await.unwrap();
    assert!(app.store.find_by_id(target.id).await.unwrap().is_none());
}

#[tokio::test]
async fn moderator_cannot_grant_admin() {
    let app = TestApp::spawn().await;
    let (_, moderator) = app.user(Role::Moderator).await;
    let (target, _) = app.user(Role::Reader).await;

    let err = app
        .services
        .moderation
        .update_user_role(&moderator, target.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let promoted = app
        .services
        .moderation
        .update_user_role(&moderator, target.id, Role::Author)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Author);
}

#[tokio::test]
async fn self_deletion_is_refused_and_account_remains() {
    let app = TestApp::spawn().await;
    let (user, admin) = app.user(Role::Admin).await;

    let err = app
        .services
        .moderation
        .delete_user(&admin, user.id)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::validation("user_id", "cannot delete self"));
    assert!(app.store.find_by_id(user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn readers_and_authors_are_not_staff() {
    let app = TestApp::spawn().await;
    let (_, reader) = app.user(Role::Reader).await;
    let (_, author) = app.user(Role::Author).await;

    for caller in [&reader, &author] {
        let err = app
            .services
            .moderation
            .list_users_for_moderation(caller, None, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}

#[tokio::test]
async fn unknown_targets_are_not_found() {
    let app = TestApp::spawn().await;
    let (_, admin) = app.user(Role::Admin).await;
    let ghost = uuid::Uuid::now_v7();

    let err = app
        .services
        .moderation
        .update_user_role(&admin, ghost, Role::Reader)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    let err = app.services.moderation.delete_user(&admin, ghost).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn user_listing_filters_by_role_with_counts() {
    let app = TestApp::spawn().await;
    let (_, moderator) = app.user(Role::Moderator).await;
    let (author_user, author) = app.user(Role::Author).await;
    let (_, reader) = app.user(Role::Reader).await;
    app.article(&author, domains::ArticleStatus::Draft).await;
    app.services
        .follows
        .toggle_follow(&reader, author_user.id)
        .await
        .unwrap();

    let authors = app
        .services
        .moderation
        .list_users_for_moderation(&moderator, Some(Role::Author), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(authors.total, 1);
    let row = &authors.items[0];
    assert_eq!(row.user.id, author_user.id);
    assert_eq!(row.article_count, 1);
    assert_eq!(row.follower_count, 1);
    assert_eq!(row.following_count, 0);
}

#[tokio::test]
async fn profile_email_must_stay_unique() {
    let app = TestApp::spawn().await;
    let (_, me) = app.user(Role::Reader).await;
    let (other, _) = app.user(Role::Reader).await;

    let err = app
        .services
        .profiles
        .update_profile(
            &me,
            domains::ProfileUpdate {
                name: "Me".into(),
                email: other.email.clone(),
                bio: None,
                avatar_url: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "email"));

    let updated = app
        .services
        .profiles
        .update_profile(
            &me,
            domains::ProfileUpdate {
                name: "  New Name ".into(),
                email: me.email.clone(),
                bio: Some("hello".into()),
                avatar_url: Some("  ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.bio.as_deref(), Some("hello"));
    assert!(updated.avatar_url.is_none());
}
