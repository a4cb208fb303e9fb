use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ModerationStatus, Project},
    error::{AppError, Result},
    repository::ProjectRepository,
};

#[derive(FromRow)]
struct ProjectRow {
    id: String,
    owner_id: String,
    title: String,
    description: String,
    tech_stack: String,
    repo_url: Option<String>,
    demo_url: Option<String>,
    image_url: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_project(row: ProjectRow) -> Result<Project> {
        Ok(Project {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            owner_id: Uuid::parse_str(&row.owner_id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            tech_stack: serde_json::from_str(&row.tech_stack).map_err(|e| AppError::Database(e.to_string()))?,
            repo_url: row.repo_url,
            demo_url: row.demo_url,
            image_url: row.image_url,
            status: ModerationStatus::from_str(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid project status: {}", row.status)))?,
            rejection_reason: row.rejection_reason,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn create(&self, project: Project) -> Result<Project> {
        let now = Utc::now().naive_utc();
        let tech_stack = serde_json::to_string(&project.tech_stack)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, owner_id, title, description, tech_stack, repo_url, demo_url,
                image_url, status, rejection_reason, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#
        )
        .bind(project.id.to_string())
        .bind(project.owner_id.to_string())
        .bind(&project.title)
        .bind(&project.description)
        .bind(tech_stack)
        .bind(&project.repo_url)
        .bind(&project.demo_url)
        .bind(&project.image_url)
        .bind(project.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(project.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created project".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_project).transpose()
    }

    async fn list_by_status(&self, status: ModerationStatus, limit: i64, offset: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT * FROM projects
            WHERE status = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#
        )
        .bind(status.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_project)
            .collect()
    }

    async fn count_by_status(&self, status: ModerationStatus) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE owner_id = ? ORDER BY created_at DESC"
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_project)
            .collect()
    }

    async fn set_status(&self, id: Uuid, status: ModerationStatus, reason: Option<&str>) -> Result<Project> {
        let result = sqlx::query(
            "UPDATE projects SET status = ?, rejection_reason = ?, updated_at = ? WHERE id = ?"
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated project".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
