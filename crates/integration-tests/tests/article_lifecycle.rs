use domains::{
    ArticleFilter, ArticleStatus, DomainError, PageRequest, ReviewDecision, Role,
};
use integration_tests::TestApp;
use services::NewArticleInput;

#[tokio::test]
async fn draft_published_by_moderator_gets_a_timestamp() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, moderator) = app.user(Role::Moderator).await;

    let draft = app.article(&author, ArticleStatus::Draft).await;
    assert_eq!(draft.article.status, ArticleStatus::Draft);
    assert!(draft.article.published_at.is_none());

    let published = app
        .services
        .articles
        .update_status(&moderator, draft.article.id, ArticleStatus::Published, None)
        .await
        .unwrap();
    assert_eq!(published.status, ArticleStatus::Published);
    assert!(published.published_at.is_some());
}

#[tokio::test]
async fn publication_timestamp_follows_every_transition() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, admin) = app.user(Role::Admin).await;
    let id = app.article(&author, ArticleStatus::Pending).await.article.id;

    for status in [
        ArticleStatus::Published,
        ArticleStatus::Rejected,
        ArticleStatus::Published,
        ArticleStatus::Draft,
        ArticleStatus::Pending,
    ] {
        let updated = app
            .services
            .articles
            .update_status(&admin, id, status, None)
            .await
            .unwrap();
        assert_eq!(updated.status, status);
        assert!(updated.publication_invariant_holds(), "broken after {status}");

        let stored = app.services.articles.get_article(id).await.unwrap();
        assert!(stored.article.publication_invariant_holds());
    }
}

#[tokio::test]
async fn authors_cannot_change_status_or_self_publish() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let id = app.article(&author, ArticleStatus::Pending).await.article.id;

    let err = app
        .services
        .articles
        .update_status(&author, id, ArticleStatus::Published, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = app
        .services
        .articles
        .create_article(
            &author,
            NewArticleInput {
                title: "Mine".into(),
                content: "Body".into(),
                status: ArticleStatus::Published,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn created_article_carries_author_and_normalized_tags() {
    let app = TestApp::spawn().await;
    let (user, author) = app.user(Role::Author).await;

    let details = app.article(&author, ArticleStatus::Draft).await;
    assert_eq!(details.author.id, user.id);
    assert_eq!(details.author.name, user.name);
    let mut tags: Vec<_> = details.tags.iter().map(|t| t.name.as_str()).collect();
    tags.sort_unstable();
    assert_eq!(tags, ["news", "rust"]);
    assert_eq!(details.clap_count, 0);
    assert_eq!(details.comment_count, 0);
}

#[tokio::test]
async fn status_change_with_comments_appends_review_history() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, moderator) = app.user(Role::Moderator).await;
    let id = app.article(&author, ArticleStatus::Pending).await.article.id;

    app.services
        .articles
        .update_status(&moderator, id, ArticleStatus::Rejected, Some("needs sources".into()))
        .await
        .unwrap();
    // Blank comments change the status without a review.
    app.services
        .articles
        .update_status(&moderator, id, ArticleStatus::Pending, Some("   ".into()))
        .await
        .unwrap();
    app.services
        .articles
        .update_status(&moderator, id, ArticleStatus::Published, Some("great".into()))
        .await
        .unwrap();

    let reviews = app.services.reviews.list_reviews(&author, id).await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].decision, ReviewDecision::Approved);
    assert_eq!(reviews[0].comments, "great");
    assert_eq!(reviews[1].decision, ReviewDecision::Rejected);
    assert!(reviews[0].reviewed_at >= reviews[1].reviewed_at);
}

#[tokio::test]
async fn standalone_review_does_not_touch_status() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, moderator) = app.user(Role::Moderator).await;
    let (_, stranger) = app.user(Role::Reader).await;
    let id = app.article(&author, ArticleStatus::Pending).await.article.id;

    app.services
        .reviews
        .append_review(&moderator, id, ReviewDecision::Approved, "looks fine")
        .await
        .unwrap();
    let stored = app.services.articles.get_article(id).await.unwrap();
    assert_eq!(stored.article.status, ArticleStatus::Pending);

    let err = app.services.reviews.list_reviews(&stranger, id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn own_listing_is_scoped_and_paginated() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, other) = app.user(Role::Author).await;
    for _ in 0..3 {
        app.article(&author, ArticleStatus::Draft).await;
    }
    app.article(&author, ArticleStatus::Pending).await;
    app.article(&other, ArticleStatus::Draft).await;

    let drafts = app
        .services
        .articles
        .list_own_articles(&author, Some(ArticleStatus::Draft), PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(drafts.total, 3);
    assert_eq!(drafts.pages, 2);
    assert_eq!(drafts.items.len(), 2);
    assert!(drafts
        .items
        .iter()
        .all(|d| d.article.author_id == author.user_id));
    assert!(drafts.items[0].article.created_at >= drafts.items[1].article.created_at);
}

#[tokio::test]
async fn text_search_matches_author_name_case_insensitively() {
    let app = TestApp::spawn().await;
    let (user, author) = app.user(Role::Author).await;
    let (_, moderator) = app.user(Role::Moderator).await;
    app.article(&author, ArticleStatus::Draft).await;

    let query = user.name.to_uppercase();
    let found = app
        .services
        .moderation
        .list_articles_for_moderation(
            &moderator,
            ArticleFilter {
                text_query: Some(format!("  {query}  ")),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.total, 1);

    let missing = app
        .services
        .moderation
        .list_articles_for_moderation(
            &moderator,
            ArticleFilter {
                text_query: Some("no such words".into()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(missing.total, 0);
}

#[tokio::test]
async fn feed_lists_only_published_newest_first() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, admin) = app.user(Role::Admin).await;
    app.article(&author, ArticleStatus::Draft).await;
    let first = app.article(&admin, ArticleStatus::Published).await.article.id;
    let second = app.article(&admin, ArticleStatus::Published).await.article.id;

    let feed = app.services.articles.published_feed(None).await.unwrap();
    let ids: Vec<_> = feed.iter().map(|d| d.article.id).collect();
    assert_eq!(ids, [second, first]);
}

#[tokio::test]
async fn delete_rules_follow_ownership_and_status() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (_, reader) = app.user(Role::Reader).await;
    let (_, moderator) = app.user(Role::Moderator).await;

    let draft = app.article(&author, ArticleStatus::Draft).await.article.id;
    let pending = app.article(&author, ArticleStatus::Pending).await.article.id;

    let err = app.services.articles.delete_article(&reader, draft).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let err = app.services.articles.delete_article(&author, pending).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    app.services.articles.delete_article(&author, draft).await.unwrap();
    app.services.articles.delete_article(&moderator, pending).await.unwrap();

    let err = app.services.articles.get_article(pending).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn comments_list_newest_first_with_author() {
    let app = TestApp::spawn().await;
    let (_, author) = app.user(Role::Author).await;
    let (reader_user, reader) = app.user(Role::Reader).await;
    let id = app.article(&author, ArticleStatus::Draft).await.article.id;

    app.services.comments.add_comment(&reader, id, "first").await.unwrap();
    app.services.comments.add_comment(&reader, id, "  second  ").await.unwrap();

    let comments = app.services.comments.list_comments(id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].comment.content, "second");
    assert_eq!(comments[0].author.id, reader_user.id);

    let err = app.services.comments.add_comment(&reader, id, "  ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let details = app.services.articles.get_article(id).await.unwrap();
    assert_eq!(details.comment_count, 2);
}
