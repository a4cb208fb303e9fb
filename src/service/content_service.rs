use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{BlogRepository, ProjectRepository},
    service::points::PointsLedger,
};

/// Numbered suffixes tried before falling back to a random one.
const MAX_SLUG_SUFFIX: usize = 50;

fn can_view(status: ModerationStatus, owner_id: Uuid, viewer: Option<&Member>) -> bool {
    status == ModerationStatus::Approved
        || viewer.map(|m| m.id == owner_id || m.is_admin()).unwrap_or(false)
}

pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
    points: Arc<PointsLedger>,
}

impl BlogService {
    pub fn new(repo: Arc<dyn BlogRepository>, points: Arc<PointsLedger>) -> Self {
        Self { repo, points }
    }

    /// `slugify(title)`, then `-2`, `-3`, ... until free.
    pub async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = match slugify(title) {
            s if s.is_empty() => "post".to_string(),
            s => s,
        };

        if !self.repo.slug_exists(&base).await? {
            return Ok(base);
        }

        for n in 2..=MAX_SLUG_SUFFIX {
            let candidate = format!("{}-{}", base, n);
            if !self.repo.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Ok(format!("{}-{}", base, &Uuid::new_v4().simple().to_string()[..8]))
    }

    pub async fn submit(&self, author_id: Uuid, request: BlogRequest) -> Result<Blog> {
        request.validate()?;

        let now = Utc::now();
        let excerpt = request.excerpt
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| derive_excerpt(&request.content));

        let blog = Blog {
            id: Uuid::new_v4(),
            author_id,
            title: request.title.trim().to_string(),
            slug: self.unique_slug(&request.title).await?,
            content: request.content,
            excerpt: Some(excerpt),
            tags: normalize_tags(&request.tags),
            cover_image_url: request.cover_image_url,
            status: ModerationStatus::Pending,
            rejection_reason: None,
            views: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        };

        let blog = self.repo.create(blog).await?;
        tracing::info!("Blog {} submitted by {}", blog.slug, author_id);

        self.points.award_or_log(author_id, Achievement::BlogSubmitted { blog_id: blog.id }).await;
        Ok(blog)
    }

    /// Approved posts are public and count a view. Others are visible to
    /// their author and admins only.
    pub async fn get_by_slug(&self, slug: &str, viewer: Option<&Member>) -> Result<Blog> {
        let mut blog = self.repo
            .find_by_slug(slug)
            .await?
            .filter(|b| can_view(b.status, b.author_id, viewer))
            .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))?;

        if blog.status == ModerationStatus::Approved {
            self.repo.increment_views(blog.id).await?;
            blog.views += 1;
        }

        Ok(blog)
    }

    pub async fn list_approved(&self, tag: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Blog>, i64)> {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty());
        let blogs = self.repo.list_by_status(ModerationStatus::Approved, tag, limit, offset).await?;
        let total = self.repo.count_by_status(ModerationStatus::Approved, tag).await?;
        Ok((blogs, total))
    }

    pub async fn list_pending(&self, limit: i64, offset: i64) -> Result<(Vec<Blog>, i64)> {
        let blogs = self.repo.list_by_status(ModerationStatus::Pending, None, limit, offset).await?;
        let total = self.repo.count_by_status(ModerationStatus::Pending, None).await?;
        Ok((blogs, total))
    }

    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Blog>> {
        self.repo.list_by_author(author_id).await
    }

    /// Authors may edit while pending or after rejection. The post goes back
    /// to the moderation queue.
    pub async fn update(&self, actor: &Member, id: Uuid, request: BlogRequest) -> Result<Blog> {
        request.validate()?;

        let existing = self.require(id).await?;
        if existing.author_id != actor.id {
            return Err(AppError::Forbidden("You can only edit your own blogs".to_string()));
        }
        if existing.status == ModerationStatus::Approved {
            return Err(AppError::BadRequest("Only pending or rejected blogs can be edited".to_string()));
        }

        let excerpt = request.excerpt
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| derive_excerpt(&request.content));

        let blog = Blog {
            title: request.title.trim().to_string(),
            content: request.content,
            excerpt: Some(excerpt),
            tags: normalize_tags(&request.tags),
            cover_image_url: request.cover_image_url,
            status: ModerationStatus::Pending,
            rejection_reason: None,
            ..existing
        };

        self.repo.update(id, blog).await
    }

    pub async fn delete(&self, actor: &Member, id: Uuid) -> Result<()> {
        let blog = self.require(id).await?;
        if blog.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden("You can only delete your own blogs".to_string()));
        }

        self.repo.delete(id).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<Blog> {
        self.require(id).await?;
        let blog = self.repo.set_status(id, ModerationStatus::Approved, None).await?;
        tracing::info!("Blog {} approved", blog.slug);

        self.points.award_or_log(blog.author_id, Achievement::BlogApproved { blog_id: blog.id }).await;
        Ok(blog)
    }

    pub async fn reject(&self, id: Uuid, request: RejectRequest) -> Result<Blog> {
        request.validate()?;
        self.require(id).await?;

        let blog = self.repo
            .set_status(id, ModerationStatus::Rejected, Some(request.reason.trim()))
            .await?;
        tracing::info!("Blog {} rejected", blog.slug);
        Ok(blog)
    }

    async fn require(&self, id: Uuid) -> Result<Blog> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))
    }
}

pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
    points: Arc<PointsLedger>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>, points: Arc<PointsLedger>) -> Self {
        Self { repo, points }
    }

    pub async fn submit(&self, owner_id: Uuid, request: ProjectRequest) -> Result<Project> {
        request.validate()?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            owner_id,
            title: request.title.trim().to_string(),
            description: request.description,
            tech_stack: request.tech_stack
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            repo_url: request.repo_url,
            demo_url: request.demo_url,
            image_url: request.image_url,
            status: ModerationStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let project = self.repo.create(project).await?;
        tracing::info!("Project {} submitted by {}", project.id, owner_id);

        self.points
            .award_or_log(owner_id, Achievement::ProjectSubmitted { project_id: project.id })
            .await;
        Ok(project)
    }

    pub async fn get(&self, id: Uuid, viewer: Option<&Member>) -> Result<Project> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|p| can_view(p.status, p.owner_id, viewer))
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    pub async fn list_approved(&self, limit: i64, offset: i64) -> Result<(Vec<Project>, i64)> {
        let projects = self.repo.list_by_status(ModerationStatus::Approved, limit, offset).await?;
        let total = self.repo.count_by_status(ModerationStatus::Approved).await?;
        Ok((projects, total))
    }

    pub async fn list_pending(&self, limit: i64, offset: i64) -> Result<(Vec<Project>, i64)> {
        let projects = self.repo.list_by_status(ModerationStatus::Pending, limit, offset).await?;
        let total = self.repo.count_by_status(ModerationStatus::Pending).await?;
        Ok((projects, total))
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>> {
        self.repo.list_by_owner(owner_id).await
    }

    pub async fn delete(&self, actor: &Member, id: Uuid) -> Result<()> {
        let project = self.require(id).await?;
        if project.owner_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden("You can only delete your own projects".to_string()));
        }

        self.repo.delete(id).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<Project> {
        self.require(id).await?;
        let project = self.repo.set_status(id, ModerationStatus::Approved, None).await?;
        tracing::info!("Project {} approved", project.id);

        self.points
            .award_or_log(project.owner_id, Achievement::ProjectApproved { project_id: project.id })
            .await;
        Ok(project)
    }

    pub async fn reject(&self, id: Uuid, request: RejectRequest) -> Result<Project> {
        request.validate()?;
        self.require(id).await?;

        self.repo
            .set_status(id, ModerationStatus::Rejected, Some(request.reason.trim()))
            .await
    }

    async fn require(&self, id: Uuid) -> Result<Project> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }
}
