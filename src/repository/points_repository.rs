use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    domain::Achievement,
    error::{AppError, Result},
    repository::PointsRepository,
};

pub struct SqlitePointsRepository {
    pool: SqlitePool,
}

impl SqlitePointsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PointsRepository for SqlitePointsRepository {
    async fn increment(&self, member_id: Uuid, points: i64) -> Result<()> {
        let result = sqlx::query("UPDATE members SET points = points + ?, updated_at = ? WHERE id = ?")
            .bind(points)
            .bind(Utc::now().naive_utc())
            .bind(member_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        Ok(())
    }

    async fn record_once(&self, member_id: Uuid, achievement: Achievement) -> Result<bool> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO point_awards (id, member_id, reason, entity_id, points, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(member_id.to_string())
        .bind(achievement.reason())
        .bind(achievement.entity_id().to_string())
        .bind(achievement.points())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE members SET points = points + ?, updated_at = ? WHERE id = ?")
            .bind(achievement.points())
            .bind(now)
            .bind(member_id.to_string())
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        tx.commit().await?;
        Ok(true)
    }
}
