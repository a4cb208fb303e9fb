#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use clubhouse::{
    config::Settings,
    domain::*,
    email::LogEmailSender,
    repository::{MemberRepository, SqliteMemberRepository},
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// A single connection keeps every query on the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub async fn test_context(settings: &Settings) -> anyhow::Result<(SqlitePool, Arc<ServiceContext>)> {
    let pool = test_pool().await?;
    let ctx = ServiceContext::new(pool.clone(), settings, Arc::new(LogEmailSender));
    Ok((pool, Arc::new(ctx)))
}

/// Inserts a verified member straight through the repository, skipping
/// password hashing.
pub async fn insert_member(pool: &SqlitePool, n: usize, unique_id: Option<String>) -> anyhow::Result<Member> {
    let repo = SqliteMemberRepository::new(pool.clone());
    let member = repo
        .create(NewMember {
            name: format!("Member {}", n),
            email: format!("member{}@example.com", n),
            password_hash: "not-a-real-hash".to_string(),
            department: Some("CSE".to_string()),
            year: Some(2),
            role: MemberRole::Member,
            is_verified: true,
            unique_id,
            verification_token_hash: None,
            verification_expires_at: None,
        })
        .await?;

    Ok(member)
}

pub fn event_request(title: &str, capacity: Option<i64>) -> EventRequest {
    let start = Utc::now() + Duration::days(7);
    EventRequest {
        title: title.to_string(),
        description: "An evening of talks and demos".to_string(),
        location: Some("Main Auditorium".to_string()),
        start_time: start,
        end_time: Some(start + Duration::hours(2)),
        capacity,
        image_url: None,
        is_published: true,
    }
}

pub fn workshop_request(title: &str, capacity: Option<i64>, requires_approval: bool) -> WorkshopRequest {
    let start = Utc::now() + Duration::days(3);
    WorkshopRequest {
        title: title.to_string(),
        description: "Hands-on session, bring a laptop".to_string(),
        instructor: Some("Dr. Rao".to_string()),
        location: Some("Lab 3".to_string()),
        start_time: start,
        end_time: Some(start + Duration::hours(3)),
        capacity,
        requires_approval,
        image_url: None,
        is_published: true,
    }
}

pub fn blog_request(title: &str) -> BlogRequest {
    BlogRequest {
        title: title.to_string(),
        content: "Ownership and borrowing take a while to click, but once they do the compiler becomes a pair programmer.".to_string(),
        excerpt: None,
        tags: vec!["Rust".to_string(), "learning".to_string()],
        cover_image_url: None,
    }
}

pub async fn points_of(ctx: &ServiceContext, member_id: Uuid) -> anyhow::Result<i64> {
    let member = ctx
        .member_repo
        .find_by_id(member_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("member {} missing", member_id))?;
    Ok(member.points)
}
