pub mod admission;
pub mod activity_service;
pub mod content_service;
pub mod member_id;
pub mod member_service;
pub mod outreach_service;
pub mod points;
pub mod registration_service;

use std::sync::Arc;
use sqlx::SqlitePool;

use crate::auth::{AttendanceSigner, AuthService};
use crate::config::Settings;
use crate::email::EmailSender;
use crate::repository::*;

use activity_service::ActivityService;
use content_service::{BlogService, ProjectService};
use member_id::MemberIdAllocator;
use member_service::MemberService;
use outreach_service::{ContactService, NewsletterService};
use points::PointsLedger;
use registration_service::RegistrationService;

pub struct ServiceContext {
    pub member_repo: Arc<dyn MemberRepository>,
    pub stats_repo: Arc<dyn StatsRepository>,
    pub auth_service: Arc<AuthService>,
    pub member_service: Arc<MemberService>,
    pub activity_service: Arc<ActivityService>,
    pub registration_service: Arc<RegistrationService>,
    pub blog_service: Arc<BlogService>,
    pub project_service: Arc<ProjectService>,
    pub contact_service: Arc<ContactService>,
    pub newsletter_service: Arc<NewsletterService>,
    pub points: Arc<PointsLedger>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings, mailer: Arc<dyn EmailSender>) -> Self {
        let members = Arc::new(SqliteMemberRepository::new(db_pool.clone()));
        let member_repo: Arc<dyn MemberRepository> = members.clone();
        let id_store: Arc<dyn MemberIdStore> = members;

        let event_repo: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let workshop_repo: Arc<dyn WorkshopRepository> = Arc::new(SqliteWorkshopRepository::new(db_pool.clone()));
        let registration_repo: Arc<dyn RegistrationRepository> =
            Arc::new(SqliteRegistrationRepository::new(db_pool.clone()));
        let blog_repo: Arc<dyn BlogRepository> = Arc::new(SqliteBlogRepository::new(db_pool.clone()));
        let project_repo: Arc<dyn ProjectRepository> = Arc::new(SqliteProjectRepository::new(db_pool.clone()));
        let contact_repo: Arc<dyn ContactRepository> = Arc::new(SqliteContactRepository::new(db_pool.clone()));
        let newsletter_repo: Arc<dyn NewsletterRepository> =
            Arc::new(SqliteNewsletterRepository::new(db_pool.clone()));
        let points_repo: Arc<dyn PointsRepository> = Arc::new(SqlitePointsRepository::new(db_pool.clone()));
        let stats_repo: Arc<dyn StatsRepository> = Arc::new(SqliteStatsRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_hours,
        ));
        let points = Arc::new(PointsLedger::new(points_repo, settings.points.award_policy));

        let member_service = Arc::new(MemberService::new(
            member_repo.clone(),
            MemberIdAllocator::new(id_store, &settings.members),
            auth_service.clone(),
            mailer,
            settings.members.assign_id_on,
            settings.server.base_url.clone(),
            settings.auth.verification_token_hours,
        ));

        let activity_service = Arc::new(ActivityService::new(event_repo.clone(), workshop_repo.clone()));
        let registration_service = Arc::new(RegistrationService::new(
            event_repo,
            workshop_repo,
            registration_repo,
            points.clone(),
            AttendanceSigner::new(&settings.auth.session_secret),
        ));

        Self {
            member_repo,
            stats_repo,
            auth_service,
            member_service,
            activity_service,
            registration_service,
            blog_service: Arc::new(BlogService::new(blog_repo, points.clone())),
            project_service: Arc::new(ProjectService::new(project_repo, points.clone())),
            contact_service: Arc::new(ContactService::new(contact_repo)),
            newsletter_service: Arc::new(NewsletterService::new(newsletter_repo)),
            points,
            db_pool,
        }
    }
}
