use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod member_repository;
pub mod event_repository;
pub mod workshop_repository;
pub mod registration_repository;
pub mod blog_repository;
pub mod project_repository;
pub mod outreach_repository;
pub mod points_repository;
pub mod stats_repository;

pub use member_repository::SqliteMemberRepository;
pub use event_repository::SqliteEventRepository;
pub use workshop_repository::SqliteWorkshopRepository;
pub use registration_repository::SqliteRegistrationRepository;
pub use blog_repository::SqliteBlogRepository;
pub use project_repository::SqliteProjectRepository;
pub use outreach_repository::{SqliteContactRepository, SqliteNewsletterRepository};
pub use points_repository::SqlitePointsRepository;
pub use stats_repository::SqliteStatsRepository;

/// The two reads the member identifier allocator needs.
#[async_trait]
pub trait MemberIdStore: Send + Sync {
    /// Members that already hold a display identifier.
    async fn count_with_unique_id(&self) -> Result<i64>;
    async fn unique_id_exists(&self, unique_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn create(&self, member: NewMember) -> Result<Member>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;
    async fn find_by_verification_token(&self, token_hash: &str) -> Result<Option<(Member, Option<DateTime<Utc>>)>>;
    async fn password_hash(&self, id: Uuid) -> Result<Option<String>>;
    async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Member>>;
    async fn count(&self, search: Option<&str>) -> Result<i64>;
    async fn leaderboard(&self, limit: i64) -> Result<Vec<Member>>;
    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Member>;
    async fn update_role(&self, id: Uuid, role: MemberRole) -> Result<Member>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn set_verification_token(&self, id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()>;
    async fn mark_verified(&self, id: Uuid) -> Result<Member>;
    /// Fails with `DuplicateKey` when another member already holds `unique_id`.
    async fn assign_unique_id(&self, id: Uuid, unique_id: &str) -> Result<Member>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: Event) -> Result<Event>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn list(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<Vec<Event>>;
    async fn count(&self, filter: ActivityFilter) -> Result<i64>;
    async fn update(&self, id: Uuid, event: Event) -> Result<Event>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait WorkshopRepository: Send + Sync {
    async fn create(&self, workshop: Workshop) -> Result<Workshop>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workshop>>;
    async fn list(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<Vec<Workshop>>;
    async fn count(&self, filter: ActivityFilter) -> Result<i64>;
    async fn update(&self, id: Uuid, workshop: Workshop) -> Result<Workshop>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Which events or workshops a listing should include.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityFilter {
    pub upcoming_only: bool,
    pub include_unpublished: bool,
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>>;
    async fn find(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<Option<Registration>>;
    /// Registrations whose status is not CANCELLED.
    async fn count_active(&self, kind: ActivityKind, activity_id: Uuid) -> Result<i64>;
    /// Inserts only while the active count is below `capacity`, in a single
    /// statement. Returns `None` when the activity was full.
    async fn insert_if_capacity(&self, registration: NewRegistration, capacity: Option<i64>) -> Result<Option<Registration>>;
    async fn update_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration>;
    async fn list_for_activity(&self, kind: ActivityKind, activity_id: Uuid) -> Result<Vec<RegistrationWithMember>>;
    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<Registration>>;
}

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: Blog) -> Result<Blog>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>>;
    async fn slug_exists(&self, slug: &str) -> Result<bool>;
    async fn list_by_status(&self, status: ModerationStatus, tag: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Blog>>;
    async fn count_by_status(&self, status: ModerationStatus, tag: Option<&str>) -> Result<i64>;
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>>;
    async fn update(&self, id: Uuid, blog: Blog) -> Result<Blog>;
    async fn set_status(&self, id: Uuid, status: ModerationStatus, reason: Option<&str>) -> Result<Blog>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: Project) -> Result<Project>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>>;
    async fn list_by_status(&self, status: ModerationStatus, limit: i64, offset: i64) -> Result<Vec<Project>>;
    async fn count_by_status(&self, status: ModerationStatus) -> Result<i64>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>>;
    async fn set_status(&self, id: Uuid, status: ModerationStatus, reason: Option<&str>) -> Result<Project>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, request: ContactRequest) -> Result<ContactMessage>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactMessage>>;
    async fn list(&self, status: Option<ContactStatus>, limit: i64, offset: i64) -> Result<Vec<ContactMessage>>;
    async fn count(&self, status: Option<ContactStatus>) -> Result<i64>;
    async fn update_status(&self, id: Uuid, status: ContactStatus) -> Result<ContactMessage>;
}

#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>>;
    async fn create(&self, email: &str) -> Result<NewsletterSubscriber>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<NewsletterSubscriber>;
    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<NewsletterSubscriber>>;
    async fn count_active(&self) -> Result<i64>;
}

#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// Atomic `points = points + ?`, no ledger entry.
    async fn increment(&self, member_id: Uuid, points: i64) -> Result<()>;
    /// Writes the ledger row and increments in one transaction. Returns
    /// `false` without incrementing when the row already existed.
    async fn record_once(&self, member_id: Uuid, achievement: Achievement) -> Result<bool>;
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn dashboard(&self) -> Result<DashboardStats>;
}
