use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::hash_token;

/// A logged-in member as seen by the request pipeline.
#[derive(Debug, Clone)]
pub struct Session {
    pub member_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_row((member_id, expires_at): (String, NaiveDateTime)) -> Result<Self> {
        let member_id = Uuid::parse_str(&member_id)
            .map_err(|e| AppError::Database(format!("session has bad member id: {}", e)))?;

        Ok(Self {
            member_id,
            expires_at: DateTime::from_naive_utc_and_offset(expires_at, Utc),
        })
    }
}

/// Sessions keyed by the SHA-256 of the bearer token.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, member_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<Session> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            "INSERT INTO sessions (id, member_id, token_hash, expires_at, created_at, last_used_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(member_id.to_string())
        .bind(hash_token(token))
        .bind(expires_at.naive_utc())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Session { member_id, expires_at })
    }

    /// Resolves a live session, recording the access in the same statement.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Session>> {
        let now = Utc::now().naive_utc();

        let row: Option<(String, NaiveDateTime)> = sqlx::query_as(
            "UPDATE sessions SET last_used_at = ?1 \
             WHERE token_hash = ?2 AND expires_at > ?1 \
             RETURNING member_id, expires_at",
        )
        .bind(now)
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Session::from_row).transpose()
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_by_member(&self, member_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE member_id = ?")
            .bind(member_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns how many sessions were removed.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store_with_member() -> (SessionStore, Uuid) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let member_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO members (id, name, email, password_hash, role, is_verified, points, created_at, updated_at) \
             VALUES (?1, 'Tara', 'tara@example.com', 'x', 'MEMBER', 1, 0, ?2, ?2)",
        )
        .bind(member_id.to_string())
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();

        (SessionStore::new(pool), member_id)
    }

    #[tokio::test]
    async fn test_live_session_resolves_to_member() {
        let (store, member_id) = store_with_member().await;
        store.create(member_id, "live-token", Utc::now() + Duration::hours(1)).await.unwrap();

        let session = store.find_by_token("live-token").await.unwrap().unwrap();
        assert_eq!(session.member_id, member_id);
        assert!(store.find_by_token("other-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored_and_purged() {
        let (store, member_id) = store_with_member().await;
        store.create(member_id, "stale-token", Utc::now() - Duration::minutes(1)).await.unwrap();
        store.create(member_id, "fresh-token", Utc::now() + Duration::hours(1)).await.unwrap();

        assert!(store.find_by_token("stale-token").await.unwrap().is_none());
        assert_eq!(store.cleanup_expired().await.unwrap(), 1);
        assert!(store.find_by_token("fresh-token").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_everywhere_drops_all_member_sessions() {
        let (store, member_id) = store_with_member().await;
        let later = Utc::now() + Duration::hours(1);
        store.create(member_id, "laptop", later).await.unwrap();
        store.create(member_id, "phone", later).await.unwrap();

        store.delete_by_member(member_id).await.unwrap();

        assert!(store.find_by_token("laptop").await.unwrap().is_none());
        assert!(store.find_by_token("phone").await.unwrap().is_none());
    }
}
