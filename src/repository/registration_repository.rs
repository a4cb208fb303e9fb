use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        ActivityKind, NewRegistration, Registration, RegistrationStatus, RegistrationWithMember,
    },
    error::{AppError, Result},
    repository::RegistrationRepository,
};

#[derive(FromRow)]
struct RegistrationRow {
    id: String,
    activity_kind: String,
    activity_id: String,
    member_id: String,
    status: String,
    registered_at: NaiveDateTime,
    attended_at: Option<NaiveDateTime>,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RegistrationMemberRow {
    #[sqlx(flatten)]
    registration: RegistrationRow,
    member_name: String,
    member_email: String,
    member_unique_id: Option<String>,
}

pub struct SqliteRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_registration(row: RegistrationRow) -> Result<Registration> {
        Ok(Registration {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            activity_kind: ActivityKind::from_str(&row.activity_kind).ok_or_else(|| {
                AppError::Database(format!("Invalid activity kind: {}", row.activity_kind))
            })?,
            activity_id: Uuid::parse_str(&row.activity_id).map_err(|e| AppError::Database(e.to_string()))?,
            member_id: Uuid::parse_str(&row.member_id).map_err(|e| AppError::Database(e.to_string()))?,
            status: RegistrationStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid registration status: {}", row.status))
            })?,
            registered_at: DateTime::from_naive_utc_and_offset(row.registered_at, Utc),
            attended_at: row.attended_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl RegistrationRepository for SqliteRegistrationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, activity_kind, activity_id, member_id, status,
                   registered_at, attended_at, updated_at
            FROM registrations
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_registration).transpose()
    }

    async fn find(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, activity_kind, activity_id, member_id, status,
                   registered_at, attended_at, updated_at
            FROM registrations
            WHERE activity_kind = ? AND activity_id = ? AND member_id = ?
            "#
        )
        .bind(kind.as_str())
        .bind(activity_id.to_string())
        .bind(member_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_registration).transpose()
    }

    async fn count_active(&self, kind: ActivityKind, activity_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM registrations
            WHERE activity_kind = ? AND activity_id = ? AND status != 'CANCELLED'
            "#
        )
        .bind(kind.as_str())
        .bind(activity_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_if_capacity(&self, registration: NewRegistration, capacity: Option<i64>) -> Result<Option<Registration>> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        // The count and the insert run as one statement, which SQLite
        // serializes against other writers.
        let result = sqlx::query(
            r#"
            INSERT INTO registrations (
                id, activity_kind, activity_id, member_id, status, registered_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?6
            WHERE ?7 IS NULL
               OR (
                   SELECT COUNT(*) FROM registrations
                   WHERE activity_kind = ?2 AND activity_id = ?3 AND status != 'CANCELLED'
               ) < ?7
            "#
        )
        .bind(id.to_string())
        .bind(registration.activity_kind.as_str())
        .bind(registration.activity_id.to_string())
        .bind(registration.member_id.to_string())
        .bind(registration.status.as_str())
        .bind(now)
        .bind(capacity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn update_status(&self, id: Uuid, status: RegistrationStatus) -> Result<Registration> {
        let now = Utc::now().naive_utc();
        let attended_at = (status == RegistrationStatus::Attended).then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET status = ?, attended_at = COALESCE(?, attended_at), updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(status.as_str())
        .bind(attended_at)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Registration not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated registration".to_string())
        })
    }

    async fn list_for_activity(&self, kind: ActivityKind, activity_id: Uuid) -> Result<Vec<RegistrationWithMember>> {
        let rows = sqlx::query_as::<_, RegistrationMemberRow>(
            r#"
            SELECT r.id, r.activity_kind, r.activity_id, r.member_id, r.status,
                   r.registered_at, r.attended_at, r.updated_at,
                   m.name AS member_name, m.email AS member_email,
                   m.unique_id AS member_unique_id
            FROM registrations r
            INNER JOIN members m ON m.id = r.member_id
            WHERE r.activity_kind = ? AND r.activity_id = ?
            ORDER BY r.registered_at ASC
            "#
        )
        .bind(kind.as_str())
        .bind(activity_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RegistrationWithMember {
                    registration: Self::row_to_registration(row.registration)?,
                    member_name: row.member_name,
                    member_email: row.member_email,
                    member_unique_id: row.member_unique_id,
                })
            })
            .collect()
    }

    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, activity_kind, activity_id, member_id, status,
                   registered_at, attended_at, updated_at
            FROM registrations
            WHERE member_id = ?
            ORDER BY registered_at DESC
            "#
        )
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_registration)
            .collect()
    }
}
