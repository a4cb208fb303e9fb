use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Member, MemberRole, NewMember, UpdateProfileRequest},
    error::{AppError, Result},
    repository::{MemberIdStore, MemberRepository},
};

const MEMBER_COLUMNS: &str = r#"
    id, unique_id, name, email, department, year, role, is_verified, points,
    bio, avatar_url, github_url, linkedin_url, created_at, updated_at
"#;

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct MemberRow {
    id: String,
    unique_id: Option<String>,
    name: String,
    email: String,
    department: Option<String>,
    year: Option<i32>,
    role: String,
    is_verified: i32,
    points: i64,
    bio: Option<String>,
    avatar_url: Option<String>,
    github_url: Option<String>,
    linkedin_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_member(row: MemberRow) -> Result<Member> {
        Ok(Member {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            unique_id: row.unique_id,
            name: row.name,
            email: row.email,
            department: row.department,
            year: row.year,
            role: MemberRole::from_str(&row.role)
                .ok_or_else(|| AppError::Database(format!("Invalid member role: {}", row.role)))?,
            is_verified: row.is_verified != 0,
            points: row.points,
            bio: row.bio,
            avatar_url: row.avatar_url,
            github_url: row.github_url,
            linkedin_url: row.linkedin_url,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE {} = ?",
            MEMBER_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_member).transpose()
    }

    async fn require(&self, id: Uuid, context: &str) -> Result<Member> {
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database(format!("Failed to retrieve {} member", context))
        })
    }

    fn search_pattern(search: Option<&str>) -> Option<String> {
        search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, member: NewMember) -> Result<Member> {
        let id = Uuid::new_v4();
        let now_naive = Utc::now().naive_utc();
        let id_str = id.to_string();

        sqlx::query(
            r#"
            INSERT INTO members (
                id, unique_id, name, email, password_hash, department, year,
                role, is_verified, verification_token_hash, verification_expires_at,
                points, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&member.unique_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.password_hash)
        .bind(&member.department)
        .bind(member.year)
        .bind(member.role.as_str())
        .bind(if member.is_verified { 1i32 } else { 0i32 })
        .bind(&member.verification_token_hash)
        .bind(member.verification_expires_at.map(|dt| dt.naive_utc()))
        .bind(now_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await?;

        self.require(id, "created").await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        self.fetch_one_by("id", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.fetch_one_by("email", &email.to_lowercase()).await
    }

    async fn find_by_verification_token(&self, token_hash: &str) -> Result<Option<(Member, Option<DateTime<Utc>>)>> {
        let expires: Option<(String, Option<NaiveDateTime>)> = sqlx::query_as(
            "SELECT id, verification_expires_at FROM members WHERE verification_token_hash = ?"
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, expires_at)) = expires else {
            return Ok(None);
        };

        let member = self.fetch_one_by("id", &id).await?;
        Ok(member.map(|m| (m, expires_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)))))
    }

    async fn password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM members WHERE id = ?"
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Member>> {
        let pattern = Self::search_pattern(search);

        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            r#"
            SELECT {}
            FROM members
            WHERE (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR unique_id LIKE ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
            MEMBER_COLUMNS
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_member)
            .collect()
    }

    async fn count(&self, search: Option<&str>) -> Result<i64> {
        let pattern = Self::search_pattern(search);

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM members
            WHERE (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR unique_id LIKE ?1)
            "#
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            r#"
            SELECT {}
            FROM members
            WHERE is_verified = 1
            ORDER BY points DESC, created_at ASC
            LIMIT ?
            "#,
            MEMBER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_member)
            .collect()
    }

    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Member> {
        let id_str = id.to_string();
        let now_naive = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE members
            SET name = COALESCE(?, name),
                year = COALESCE(?, year),
                bio = COALESCE(?, bio),
                avatar_url = COALESCE(?, avatar_url),
                github_url = COALESCE(?, github_url),
                linkedin_url = COALESCE(?, linkedin_url),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&update.name)
        .bind(update.year)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(&update.github_url)
        .bind(&update.linkedin_url)
        .bind(now_naive)
        .bind(&id_str)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.require(id, "updated").await
    }

    async fn update_role(&self, id: Uuid, role: MemberRole) -> Result<Member> {
        let result = sqlx::query("UPDATE members SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.require(id, "updated").await
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE members SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_verification_token(&self, id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE members
            SET verification_token_hash = ?, verification_expires_at = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(token_hash)
        .bind(expires_at.naive_utc())
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Member> {
        sqlx::query(
            r#"
            UPDATE members
            SET is_verified = 1,
                verification_token_hash = NULL,
                verification_expires_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.require(id, "verified").await
    }

    async fn assign_unique_id(&self, id: Uuid, unique_id: &str) -> Result<Member> {
        sqlx::query("UPDATE members SET unique_id = ?, updated_at = ? WHERE id = ? AND unique_id IS NULL")
            .bind(unique_id)
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.require(id, "updated").await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl MemberIdStore for SqliteMemberRepository {
    async fn count_with_unique_id(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM members WHERE unique_id IS NOT NULL"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn unique_id_exists(&self, unique_id: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM members WHERE unique_id = ? LIMIT 1"
        )
        .bind(unique_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }
}
