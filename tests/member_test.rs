mod common;

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use clubhouse::{
    auth::AuthService,
    config::{MemberConfig, Settings},
    domain::*,
    email::LogEmailSender,
    error::{AppError, Result},
    repository::{MemberIdStore, MemberRepository, SqliteMemberRepository},
    service::{member_id::MemberIdAllocator, member_service::MemberService},
};
use common::{insert_member, test_context, test_pool};
use uuid::Uuid;

fn allocator(pool: &sqlx::SqlitePool) -> MemberIdAllocator {
    let store: Arc<dyn MemberIdStore> = Arc::new(SqliteMemberRepository::new(pool.clone()));
    MemberIdAllocator::new(store, &MemberConfig::default())
}

#[tokio::test]
async fn test_first_id_for_any_category() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let allocator = allocator(&pool);

    assert_eq!(allocator.allocate(Some("CSE")).await?, "DAIC-CSE-00001");
    assert_eq!(allocator.allocate(Some("ece")).await?, "DAIC-ECE-00001");
    assert_eq!(allocator.allocate(None).await?, "DAIC-GEN-00001");

    Ok(())
}

#[tokio::test]
async fn test_fifth_member_gets_ordinal_five() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let allocator = allocator(&pool);

    for n in 1..=4 {
        let id = allocator.allocate(Some("ECE")).await?;
        insert_member(&pool, n, Some(id)).await?;
    }

    assert_eq!(allocator.allocate(Some("CSE")).await?, "DAIC-CSE-00005");
    Ok(())
}

#[tokio::test]
async fn test_sequential_allocations_are_distinct() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let allocator = allocator(&pool);
    let categories = ["CSE", "ECE", "MECH"];

    let mut seen = HashSet::new();
    for n in 0..12 {
        let id = allocator.allocate(Some(categories[n % categories.len()])).await?;
        insert_member(&pool, n, Some(id.clone())).await?;
        assert!(seen.insert(id.clone()), "duplicate id {}", id);
    }

    assert_eq!(seen.len(), 12);
    assert!(seen.contains("DAIC-CSE-00001"));
    assert!(seen.contains("DAIC-ECE-00002"));
    assert!(seen.contains("DAIC-MECH-00012"));
    Ok(())
}

#[tokio::test]
async fn test_taken_candidate_moves_to_next_ordinal() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let allocator = allocator(&pool);

    // One member holds an id out of sequence
    insert_member(&pool, 1, Some("DAIC-CSE-00002".to_string())).await?;

    assert_eq!(allocator.allocate(Some("CSE")).await?, "DAIC-CSE-00003");
    Ok(())
}

#[tokio::test]
async fn test_register_assigns_id_and_verifies() -> anyhow::Result<()> {
    let (_pool, ctx) = test_context(&Settings::default()).await?;

    let registered = ctx.member_service
        .register(RegisterRequest {
            name: "Asha Verma".to_string(),
            email: "Asha@Example.com".to_string(),
            password: "correct-horse".to_string(),
            department: Some("cse".to_string()),
            year: Some(3),
        })
        .await?;

    assert_eq!(registered.member.email, "asha@example.com");
    assert_eq!(registered.member.unique_id.as_deref(), Some("DAIC-CSE-00001"));
    assert!(!registered.member.is_verified);

    let login = ctx.member_service.authenticate("asha@example.com", "correct-horse").await;
    assert!(matches!(login, Err(AppError::Forbidden(_))));

    let verified = ctx.member_service.verify_email(&registered.verification_token).await?;
    assert!(verified.is_verified);

    let member = ctx.member_service.authenticate("asha@example.com", "correct-horse").await?;
    assert_eq!(member.id, registered.member.id);

    let wrong = ctx.member_service.authenticate("asha@example.com", "wrong-password").await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

    // Tokens are single use
    let again = ctx.member_service.verify_email(&registered.verification_token).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    insert_member(&pool, 1, None).await?;

    let result = ctx.member_service
        .register(RegisterRequest {
            name: "Someone Else".to_string(),
            email: "MEMBER1@example.com".to_string(),
            password: "password123".to_string(),
            department: None,
            year: None,
        })
        .await;

    match result {
        Err(AppError::Conflict(message)) => assert_eq!(message, "Email already registered"),
        other => panic!("expected conflict, got {:?}", other.map(|r| r.member.id)),
    }

    Ok(())
}

#[tokio::test]
async fn test_id_assigned_on_verification_when_configured() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.members.assign_id_on = AssignIdOn::Verification;
    let (_pool, ctx) = test_context(&settings).await?;

    let registered = ctx.member_service
        .register(RegisterRequest {
            name: "Ravi Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            password: "password123".to_string(),
            department: Some("EEE".to_string()),
            year: Some(1),
        })
        .await?;
    assert!(registered.member.unique_id.is_none());

    let verified = ctx.member_service.verify_email(&registered.verification_token).await?;
    assert_eq!(verified.unique_id.as_deref(), Some("DAIC-EEE-00001"));

    Ok(())
}

#[tokio::test]
async fn test_leaderboard_orders_by_points() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let low = insert_member(&pool, 1, None).await?;
    let high = insert_member(&pool, 2, None).await?;

    ctx.points.award(high.id, Achievement::ProjectApproved { project_id: Uuid::new_v4() }).await?;
    ctx.points.award(low.id, Achievement::EventRegistered { event_id: Uuid::new_v4() }).await?;

    let board = ctx.member_service.leaderboard(None).await?;
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].member_id, high.id);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].points, 25);
    assert_eq!(board[1].points, 5);

    Ok(())
}

/// Rejects the first `collisions` inserts with the unique-index error a
/// concurrent sign-up would cause, then writes through to SQLite.
struct CollidingMembers {
    inner: SqliteMemberRepository,
    collisions: usize,
    creates: AtomicUsize,
}

#[async_trait]
impl MemberRepository for CollidingMembers {
    async fn create(&self, member: NewMember) -> Result<Member> {
        let attempt = self.creates.fetch_add(1, Ordering::SeqCst);
        if attempt < self.collisions {
            return Err(AppError::DuplicateKey(
                "UNIQUE constraint failed: members.unique_id".to_string(),
            ));
        }
        self.inner.create(member).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.inner.find_by_email(email).await
    }

    async fn find_by_verification_token(&self, token_hash: &str) -> Result<Option<(Member, Option<DateTime<Utc>>)>> {
        self.inner.find_by_verification_token(token_hash).await
    }

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
        self.inner.password_hash(id).await
    }

    async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Member>> {
        self.inner.list(search, limit, offset).await
    }

    async fn count(&self, search: Option<&str>) -> Result<i64> {
        self.inner.count(search).await
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Member>> {
        self.inner.leaderboard(limit).await
    }

    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Member> {
        self.inner.update_profile(id, update).await
    }

    async fn update_role(&self, id: Uuid, role: MemberRole) -> Result<Member> {
        self.inner.update_role(id, role).await
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.inner.update_password_hash(id, password_hash).await
    }

    async fn set_verification_token(&self, id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.inner.set_verification_token(id, token_hash, expires_at).await
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Member> {
        self.inner.mark_verified(id).await
    }

    async fn assign_unique_id(&self, id: Uuid, unique_id: &str) -> Result<Member> {
        self.inner.assign_unique_id(id, unique_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }
}

fn colliding_service(pool: &sqlx::SqlitePool, collisions: usize) -> (Arc<CollidingMembers>, MemberService) {
    let repo = Arc::new(CollidingMembers {
        inner: SqliteMemberRepository::new(pool.clone()),
        collisions,
        creates: AtomicUsize::new(0),
    });

    let service = MemberService::new(
        repo.clone(),
        allocator(pool),
        Arc::new(AuthService::new(pool.clone(), 24)),
        Arc::new(LogEmailSender),
        AssignIdOn::Registration,
        "http://localhost:3000".to_string(),
        24,
    );

    (repo, service)
}

fn signup(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Meera Iyer".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        department: Some("CSE".to_string()),
        year: Some(2),
    }
}

#[tokio::test]
async fn test_register_retries_after_id_collision() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let (repo, service) = colliding_service(&pool, 1);

    let registered = service.register(signup("meera@example.com")).await?;

    assert_eq!(repo.creates.load(Ordering::SeqCst), 2);
    assert_eq!(registered.member.unique_id.as_deref(), Some("DAIC-CSE-00001"));
    Ok(())
}

#[tokio::test]
async fn test_register_gives_up_after_repeated_id_collisions() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let (repo, service) = colliding_service(&pool, usize::MAX);

    let result = service.register(signup("meera@example.com")).await;

    match result {
        Err(e @ AppError::DuplicateKey(_)) => assert_eq!(e.status_code(), StatusCode::CONFLICT),
        other => panic!("expected duplicate key, got {:?}", other.map(|r| r.member.id)),
    }
    assert_eq!(repo.creates.load(Ordering::SeqCst), 3);
    assert!(repo.find_by_email("meera@example.com").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_id_assignment_keeps_verification_token_usable() -> anyhow::Result<()> {
    let mut settings = Settings::default();
    settings.members.assign_id_on = AssignIdOn::Verification;
    let (pool, ctx) = test_context(&settings).await?;

    let registered = ctx.member_service.register(signup("kiran@example.com")).await?;

    sqlx::query(
        "CREATE TRIGGER block_member_ids BEFORE UPDATE OF unique_id ON members \
         BEGIN SELECT RAISE(ABORT, 'id store unavailable'); END",
    )
    .execute(&pool)
    .await?;

    let first = ctx.member_service.verify_email(&registered.verification_token).await;
    assert!(first.is_err());

    let member = ctx.member_repo
        .find_by_id(registered.member.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("member missing"))?;
    assert!(!member.is_verified);
    assert!(member.unique_id.is_none());

    sqlx::query("DROP TRIGGER block_member_ids").execute(&pool).await?;

    let verified = ctx.member_service.verify_email(&registered.verification_token).await?;
    assert!(verified.is_verified);
    assert_eq!(verified.unique_id.as_deref(), Some("DAIC-CSE-00001"));
    Ok(())
}
