mod common;

use clubhouse::{config::Settings, domain::*, error::AppError};
use common::{blog_request, insert_member, points_of, test_context};

#[tokio::test]
async fn test_reapproval_awards_once_by_default() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let author = insert_member(&pool, 1, None).await?;

    let blog = ctx.blog_service.submit(author.id, blog_request("Learning Rust in a Semester")).await?;
    assert_eq!(points_of(&ctx, author.id).await?, 10);

    ctx.blog_service.approve(blog.id).await?;
    ctx.blog_service.approve(blog.id).await?;
    assert_eq!(points_of(&ctx, author.id).await?, 10 + 20);

    Ok(())
}

#[tokio::test]
async fn test_reapproval_awards_again_when_unconditional() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.points.award_policy = AwardPolicy::Unconditional;
    let (pool, ctx) = test_context(&settings).await?;
    let owner = insert_member(&pool, 1, None).await?;

    let project = ctx.project_service
        .submit(owner.id, ProjectRequest {
            title: "Lab Inventory".to_string(),
            description: "Tracks borrowed lab equipment and due dates".to_string(),
            tech_stack: vec!["Rust".to_string(), "SQLite".to_string()],
            repo_url: Some("https://github.com/example/lab-inventory".to_string()),
            demo_url: None,
            image_url: None,
        })
        .await?;
    assert_eq!(points_of(&ctx, owner.id).await?, 15);

    ctx.project_service.approve(project.id).await?;
    ctx.project_service.approve(project.id).await?;
    assert_eq!(points_of(&ctx, owner.id).await?, 15 + 25 + 25);

    Ok(())
}

#[tokio::test]
async fn test_slugs_stay_unique() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let author = insert_member(&pool, 1, None).await?;

    let first = ctx.blog_service.submit(author.id, blog_request("Hello, World!")).await?;
    let second = ctx.blog_service.submit(author.id, blog_request("Hello World")).await?;

    assert_eq!(first.slug, "hello-world");
    assert_eq!(second.slug, "hello-world-2");
    assert_eq!(first.tags, vec!["rust".to_string(), "learning".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_pending_blog_visibility_and_views() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let author = insert_member(&pool, 1, None).await?;
    let stranger = insert_member(&pool, 2, None).await?;

    let blog = ctx.blog_service.submit(author.id, blog_request("Async Rust Pitfalls")).await?;

    let anonymous = ctx.blog_service.get_by_slug(&blog.slug, None).await;
    assert!(matches!(anonymous, Err(AppError::NotFound(_))));
    let other = ctx.blog_service.get_by_slug(&blog.slug, Some(&stranger)).await;
    assert!(matches!(other, Err(AppError::NotFound(_))));

    let own = ctx.blog_service.get_by_slug(&blog.slug, Some(&author)).await?;
    assert_eq!(own.views, 0);

    ctx.blog_service.approve(blog.id).await?;
    let public = ctx.blog_service.get_by_slug(&blog.slug, None).await?;
    assert_eq!(public.views, 1);
    assert!(public.published_at.is_some());

    let (tagged, total) = ctx.blog_service.list_approved(Some("RUST"), 10, 0).await?;
    assert_eq!(total, 1);
    assert_eq!(tagged[0].id, blog.id);
    let (untagged, _) = ctx.blog_service.list_approved(Some("python"), 10, 0).await?;
    assert!(untagged.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_only_unapproved_blogs_are_editable() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let author = insert_member(&pool, 1, None).await?;
    let stranger = insert_member(&pool, 2, None).await?;

    let blog = ctx.blog_service.submit(author.id, blog_request("Draft Thoughts on Traits")).await?;
    let rejected = ctx.blog_service
        .reject(blog.id, RejectRequest { reason: "Needs code samples".to_string() })
        .await?;
    assert_eq!(rejected.status, ModerationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Needs code samples"));

    let not_theirs = ctx.blog_service
        .update(&stranger, blog.id, blog_request("Hijacked Title Here"))
        .await;
    assert!(matches!(not_theirs, Err(AppError::Forbidden(_))));

    let resubmitted = ctx.blog_service
        .update(&author, blog.id, blog_request("Thoughts on Traits, Revised"))
        .await?;
    assert_eq!(resubmitted.status, ModerationStatus::Pending);
    assert!(resubmitted.rejection_reason.is_none());

    ctx.blog_service.approve(blog.id).await?;
    let locked = ctx.blog_service
        .update(&author, blog.id, blog_request("One More Edit Please"))
        .await;
    assert!(matches!(locked, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn test_newsletter_subscription_lifecycle() -> anyhow::Result<()> {
    let (_pool, ctx) = test_context(&Settings::default()).await?;
    let request = || NewsletterRequest { email: "Reader@Example.com".to_string() };

    let subscriber = ctx.newsletter_service.subscribe(request()).await?;
    assert!(subscriber.is_active);
    assert_eq!(subscriber.email, "reader@example.com");

    let again = ctx.newsletter_service.subscribe(request()).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let gone = ctx.newsletter_service.unsubscribe(request()).await?;
    assert!(!gone.is_active);
    assert!(gone.unsubscribed_at.is_some());

    let missing = ctx.newsletter_service.unsubscribe(request()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let back = ctx.newsletter_service.subscribe(request()).await?;
    assert_eq!(back.id, subscriber.id);
    assert!(back.is_active);

    Ok(())
}

#[tokio::test]
async fn test_contact_messages_filtered_by_status() -> anyhow::Result<()> {
    let (_pool, ctx) = test_context(&Settings::default()).await?;

    let message = ctx.contact_service
        .submit(ContactRequest {
            name: "Priya".to_string(),
            email: "priya@example.com".to_string(),
            subject: "Sponsorship".to_string(),
            message: "We would like to sponsor the next hackathon.".to_string(),
        })
        .await?;
    assert_eq!(message.status, ContactStatus::New);

    ctx.contact_service.update_status(message.id, ContactStatus::Read).await?;

    let (new_messages, new_total) = ctx.contact_service.list(Some(ContactStatus::New), 10, 0).await?;
    assert!(new_messages.is_empty());
    assert_eq!(new_total, 0);

    let (all, total) = ctx.contact_service.list(None, 10, 0).await?;
    assert_eq!(total, 1);
    assert_eq!(all[0].status, ContactStatus::Read);

    Ok(())
}
