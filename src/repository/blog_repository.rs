use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Blog, ModerationStatus},
    error::{AppError, Result},
    repository::BlogRepository,
};

#[derive(FromRow)]
struct BlogRow {
    id: String,
    author_id: String,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    tags: String,
    cover_image_url: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    views: i64,
    published_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBlogRepository {
    pool: SqlitePool,
}

impl SqliteBlogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_blog(row: BlogRow) -> Result<Blog> {
        Ok(Blog {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            author_id: Uuid::parse_str(&row.author_id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            tags: serde_json::from_str(&row.tags).map_err(|e| AppError::Database(e.to_string()))?,
            cover_image_url: row.cover_image_url,
            status: ModerationStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid blog status: {}", row.status)))?,
            rejection_reason: row.rejection_reason,
            views: row.views,
            published_at: row.published_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn encode_tags(tags: &[String]) -> Result<String> {
        serde_json::to_string(tags).map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[async_trait]
impl BlogRepository for SqliteBlogRepository {
    async fn create(&self, blog: Blog) -> Result<Blog> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO blogs (
                id, author_id, title, slug, content, excerpt, tags, cover_image_url,
                status, rejection_reason, views, published_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, 0, NULL, ?, ?)
            "#
        )
        .bind(blog.id.to_string())
        .bind(blog.author_id.to_string())
        .bind(&blog.title)
        .bind(&blog.slug)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(Self::encode_tags(&blog.tags)?)
        .bind(&blog.cover_image_url)
        .bind(blog.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(blog.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created blog".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>> {
        let row = sqlx::query_as::<_, BlogRow>("SELECT * FROM blogs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_blog).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>> {
        let row = sqlx::query_as::<_, BlogRow>("SELECT * FROM blogs WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_blog).transpose()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM blogs WHERE slug = ? LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn list_by_status(&self, status: ModerationStatus, tag: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Blog>> {
        let rows = sqlx::query_as::<_, BlogRow>(
            r#"
            SELECT * FROM blogs
            WHERE status = ?1
              AND (?2 IS NULL OR EXISTS (
                  SELECT 1 FROM json_each(blogs.tags) WHERE json_each.value = ?2
              ))
            ORDER BY COALESCE(published_at, created_at) DESC
            LIMIT ?3 OFFSET ?4
            "#
        )
        .bind(status.as_str())
        .bind(tag.map(str::to_lowercase))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_blog)
            .collect()
    }

    async fn count_by_status(&self, status: ModerationStatus, tag: Option<&str>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM blogs
            WHERE status = ?1
              AND (?2 IS NULL OR EXISTS (
                  SELECT 1 FROM json_each(blogs.tags) WHERE json_each.value = ?2
              ))
            "#
        )
        .bind(status.as_str())
        .bind(tag.map(str::to_lowercase))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>> {
        let rows = sqlx::query_as::<_, BlogRow>(
            "SELECT * FROM blogs WHERE author_id = ? ORDER BY created_at DESC"
        )
        .bind(author_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_blog)
            .collect()
    }

    async fn update(&self, id: Uuid, blog: Blog) -> Result<Blog> {
        let result = sqlx::query(
            r#"
            UPDATE blogs
            SET title = ?, content = ?, excerpt = ?, tags = ?, cover_image_url = ?,
                status = ?, rejection_reason = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(Self::encode_tags(&blog.tags)?)
        .bind(&blog.cover_image_url)
        .bind(blog.status.as_str())
        .bind(&blog.rejection_reason)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Blog not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated blog".to_string())
        })
    }

    async fn set_status(&self, id: Uuid, status: ModerationStatus, reason: Option<&str>) -> Result<Blog> {
        let now = Utc::now().naive_utc();
        // published_at is stamped on first approval only
        let published_at = (status == ModerationStatus::Approved).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE blogs
            SET status = ?, rejection_reason = ?,
                published_at = COALESCE(published_at, ?), updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(published_at)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Blog not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated blog".to_string())
        })
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE blogs SET views = views + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
