use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::DashboardStats,
    error::Result,
    repository::StatsRepository,
};

#[derive(FromRow)]
struct MemberCounts {
    total: i64,
    verified: i64,
    admins: i64,
    points: i64,
}

#[derive(FromRow)]
struct ActivityCounts {
    total: i64,
    upcoming: i64,
}

#[derive(FromRow)]
struct ModerationCounts {
    pending: i64,
    approved: i64,
}

pub struct SqliteStatsRepository {
    pool: SqlitePool,
}

impl SqliteStatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn activity_counts(&self, table: &str) -> Result<ActivityCounts> {
        let counts = sqlx::query_as::<_, ActivityCounts>(&format!(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN start_time > ? THEN 1 ELSE 0 END), 0) AS upcoming
            FROM {}
            "#,
            table
        ))
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn moderation_counts(&self, table: &str) -> Result<ModerationCounts> {
        let counts = sqlx::query_as::<_, ModerationCounts>(&format!(
            r#"
            SELECT COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0) AS pending,
                   COALESCE(SUM(CASE WHEN status = 'APPROVED' THEN 1 ELSE 0 END), 0) AS approved
            FROM {}
            "#,
            table
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn dashboard(&self) -> Result<DashboardStats> {
        let members = sqlx::query_as::<_, MemberCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(is_verified), 0) AS verified,
                   COALESCE(SUM(CASE WHEN role = 'ADMIN' THEN 1 ELSE 0 END), 0) AS admins,
                   COALESCE(SUM(points), 0) AS points
            FROM members
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        let events = self.activity_counts("events").await?;
        let workshops = self.activity_counts("workshops").await?;
        let blogs = self.moderation_counts("blogs").await?;
        let projects = self.moderation_counts("projects").await?;

        let active_registrations = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE status != 'CANCELLED'"
        )
        .fetch_one(&self.pool)
        .await?;

        let new_contact_messages = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_messages WHERE status = 'NEW'"
        )
        .fetch_one(&self.pool)
        .await?;

        let active_subscribers = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM newsletter_subscribers WHERE is_active = 1"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_members: members.total,
            verified_members: members.verified,
            unverified_members: members.total - members.verified,
            admins: members.admins,
            total_events: events.total,
            upcoming_events: events.upcoming,
            total_workshops: workshops.total,
            upcoming_workshops: workshops.upcoming,
            active_registrations,
            pending_blogs: blogs.pending,
            approved_blogs: blogs.approved,
            pending_projects: projects.pending,
            approved_projects: projects.approved,
            new_contact_messages,
            active_subscribers,
            total_points_awarded: members.points,
        })
    }
}
