use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ActivityKind, Event},
    error::{AppError, Result},
    repository::{ActivityFilter, EventRepository},
};

#[derive(FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    location: Option<String>,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    capacity: Option<i64>,
    image_url: Option<String>,
    is_published: i32,
    created_by: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> Result<Event> {
        Ok(Event {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            location: row.location,
            start_time: DateTime::from_naive_utc_and_offset(row.start_time, Utc),
            end_time: row.end_time.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            capacity: row.capacity,
            image_url: row.image_url,
            is_published: row.is_published != 0,
            created_by: Uuid::parse_str(&row.created_by).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, event: Event) -> Result<Event> {
        let id_str = event.id.to_string();
        let created_by_str = event.created_by.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, location, start_time, end_time, capacity,
                image_url, is_published, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_time.naive_utc())
        .bind(event.end_time.map(|dt| dt.naive_utc()))
        .bind(event.capacity)
        .bind(&event.image_url)
        .bind(if event.is_published { 1i32 } else { 0i32 })
        .bind(&created_by_str)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(event.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created event".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, description, location, start_time, end_time, capacity,
                   image_url, is_published, created_by, created_at, updated_at
            FROM events
            WHERE id = ?
            "#
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_event(r)?)),
            None => Ok(None)
        }
    }

    async fn list(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<Vec<Event>> {
        // Upcoming listings read soonest-first, archives newest-first
        let order = if filter.upcoming_only { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT id, title, description, location, start_time, end_time, capacity,
                   image_url, is_published, created_by, created_at, updated_at
            FROM events
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
            .map(Self::row_to_event)
            .collect()
    }

    async fn count(&self, filter: ActivityFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM events
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

    async fn update(&self, id: Uuid, event: Event) -> Result<Event> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, location = ?, start_time = ?, end_time = ?,
                capacity = ?, image_url = ?, is_published = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_time.naive_utc())
        .bind(event.end_time.map(|dt| dt.naive_utc()))
        .bind(event.capacity)
        .bind(&event.image_url)
        .bind(if event.is_published { 1i32 } else { 0i32 })
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated event".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM registrations WHERE activity_kind = ? AND activity_id = ?")
            .bind(ActivityKind::Event.as_str())
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
