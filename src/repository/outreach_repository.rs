use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ContactMessage, ContactRequest, ContactStatus, NewsletterSubscriber},
    error::{AppError, Result},
    repository::{ContactRepository, NewsletterRepository},
};

#[derive(FromRow)]
struct ContactRow {
    id: String,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct SubscriberRow {
    id: String,
    email: String,
    is_active: i32,
    subscribed_at: NaiveDateTime,
    unsubscribed_at: Option<NaiveDateTime>,
}

pub struct SqliteContactRepository {
    pool: SqlitePool,
}

impl SqliteContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_message(row: ContactRow) -> Result<ContactMessage> {
        Ok(ContactMessage {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            status: ContactStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid contact status: {}", row.status)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ContactRepository for SqliteContactRepository {
    async fn create(&self, request: ContactRequest) -> Result<ContactMessage> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO contact_messages (id, name, email, subject, message, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.name.trim())
        .bind(request.email.trim().to_lowercase())
        .bind(request.subject.trim())
        .bind(request.message.trim())
        .bind(ContactStatus::New.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created contact message".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactMessage>> {
        let row = sqlx::query_as::<_, ContactRow>("SELECT * FROM contact_messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_message).transpose()
    }

    async fn list(&self, status: Option<ContactStatus>, limit: i64, offset: i64) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT * FROM contact_messages
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        )
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_message)
            .collect()
    }

    async fn count(&self, status: Option<ContactStatus>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_messages WHERE (?1 IS NULL OR status = ?1)"
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_status(&self, id: Uuid, status: ContactStatus) -> Result<ContactMessage> {
        let result = sqlx::query("UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Contact message not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated contact message".to_string())
        })
    }
}

pub struct SqliteNewsletterRepository {
    pool: SqlitePool,
}

impl SqliteNewsletterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_subscriber(row: SubscriberRow) -> Result<NewsletterSubscriber> {
        Ok(NewsletterSubscriber {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            is_active: row.is_active != 0,
            subscribed_at: DateTime::from_naive_utc_and_offset(row.subscribed_at, Utc),
            unsubscribed_at: row.unsubscribed_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NewsletterSubscriber>> {
        let row = sqlx::query_as::<_, SubscriberRow>("SELECT * FROM newsletter_subscribers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_subscriber).transpose()
    }
}

#[async_trait]
impl NewsletterRepository for SqliteNewsletterRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        let row = sqlx::query_as::<_, SubscriberRow>("SELECT * FROM newsletter_subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_subscriber).transpose()
    }

    async fn create(&self, email: &str) -> Result<NewsletterSubscriber> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO newsletter_subscribers (id, email, is_active, subscribed_at)
            VALUES (?, ?, 1, ?)
            "#
        )
        .bind(id.to_string())
        .bind(email)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created subscriber".to_string())
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<NewsletterSubscriber> {
        let now = Utc::now().naive_utc();
        let query = if active {
            "UPDATE newsletter_subscribers SET is_active = 1, subscribed_at = ?, unsubscribed_at = NULL WHERE id = ?"
        } else {
            "UPDATE newsletter_subscribers SET is_active = 0, unsubscribed_at = ? WHERE id = ?"
        };

        sqlx::query(query)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Subscriber not found".to_string())
        })
    }

    async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<NewsletterSubscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT * FROM newsletter_subscribers
            WHERE is_active = 1
            ORDER BY subscribed_at DESC
            LIMIT ? OFFSET ?
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_subscriber)
            .collect()
    }

    async fn count_active(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM newsletter_subscribers WHERE is_active = 1"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
