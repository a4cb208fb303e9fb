use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ActivityKind, Workshop},
    error::{AppError, Result},
    repository::{ActivityFilter, WorkshopRepository},
};

#[derive(FromRow)]
struct WorkshopRow {
    id: String,
    title: String,
    description: String,
    instructor: Option<String>,
    location: Option<String>,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    capacity: Option<i64>,
    requires_approval: i32,
    image_url: Option<String>,
    is_published: i32,
    created_by: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteWorkshopRepository {
    pool: SqlitePool,
}

impl SqliteWorkshopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_workshop(row: WorkshopRow) -> Result<Workshop> {
        Ok(Workshop {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            instructor: row.instructor,
            location: row.location,
            start_time: DateTime::from_naive_utc_and_offset(row.start_time, Utc),
            end_time: row.end_time.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            capacity: row.capacity,
            requires_approval: row.requires_approval != 0,
            image_url: row.image_url,
            is_published: row.is_published != 0,
            created_by: Uuid::parse_str(&row.created_by).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl WorkshopRepository for SqliteWorkshopRepository {
    async fn create(&self, workshop: Workshop) -> Result<Workshop> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO workshops (
                id, title, description, instructor, location, start_time, end_time,
                capacity, requires_approval, image_url, is_published, created_by,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(workshop.id.to_string())
        .bind(&workshop.title)
        .bind(&workshop.description)
        .bind(&workshop.instructor)
        .bind(&workshop.location)
        .bind(workshop.start_time.naive_utc())
        .bind(workshop.end_time.map(|dt| dt.naive_utc()))
        .bind(workshop.capacity)
        .bind(if workshop.requires_approval { 1i32 } else { 0i32 })
        .bind(&workshop.image_url)
        .bind(if workshop.is_published { 1i32 } else { 0i32 })
        .bind(workshop.created_by.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(workshop.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created workshop".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workshop>> {
        let row = sqlx::query_as::<_, WorkshopRow>(
            r#"
            SELECT id, title, description, instructor, location, start_time, end_time,
                   capacity, requires_approval, image_url, is_published, created_by,
                   created_at, updated_at
            FROM workshops
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_workshop).transpose()
    }

    async fn list(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<Vec<Workshop>> {
        let order = if filter.upcoming_only { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, WorkshopRow>(&format!(
            r#"
            SELECT id, title, description, instructor, location, start_time, end_time,
                   capacity, requires_approval, image_url, is_published, created_by,
                   created_at, updated_at
            FROM workshops
            WHERE (?1 = 1 OR is_published = 1)
              AND (?2 = 0 OR start_time > ?3)
            ORDER BY start_time {}
            LIMIT ?4 OFFSET ?5
            "#,
            order
        ))
        .bind(filter.include_unpublished as i32)
        .bind(filter.upcoming_only as i32)
        .bind(Utc::now().naive_utc())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_workshop)
            .collect()
    }

    async fn count(&self, filter: ActivityFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM workshops
            WHERE (?1 = 1 OR is_published = 1)
              AND (?2 = 0 OR start_time > ?3)
            "#
        )
        .bind(filter.include_unpublished as i32)
        .bind(filter.upcoming_only as i32)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update(&self, id: Uuid, workshop: Workshop) -> Result<Workshop> {
        let result = sqlx::query(
            r#"
            UPDATE workshops
            SET title = ?, description = ?, instructor = ?, location = ?, start_time = ?,
                end_time = ?, capacity = ?, requires_approval = ?, image_url = ?,
                is_published = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&workshop.title)
        .bind(&workshop.description)
        .bind(&workshop.instructor)
        .bind(&workshop.location)
        .bind(workshop.start_time.naive_utc())
        .bind(workshop.end_time.map(|dt| dt.naive_utc()))
        .bind(workshop.capacity)
        .bind(if workshop.requires_approval { 1i32 } else { 0i32 })
        .bind(&workshop.image_url)
        .bind(if workshop.is_published { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Workshop not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated workshop".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM registrations WHERE activity_kind = ? AND activity_id = ?")
            .bind(ActivityKind::Workshop.as_str())
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM workshops WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
