use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{ContactRepository, NewsletterRepository},
};

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, request: ContactRequest) -> Result<ContactMessage> {
        request.validate()?;
        let message = self.repo.create(request).await?;
        tracing::info!("Contact message {} received", message.id);
        Ok(message)
    }

    pub async fn list(&self, status: Option<ContactStatus>, limit: i64, offset: i64) -> Result<(Vec<ContactMessage>, i64)> {
        let messages = self.repo.list(status, limit, offset).await?;
        let total = self.repo.count(status).await?;
        Ok((messages, total))
    }

    pub async fn update_status(&self, id: Uuid, status: ContactStatus) -> Result<ContactMessage> {
        self.repo.update_status(id, status).await
    }
}

pub struct NewsletterService {
    repo: Arc<dyn NewsletterRepository>,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterRepository>) -> Self {
        Self { repo }
    }

    /// New addresses are inserted, lapsed ones reactivated.
    pub async fn subscribe(&self, request: NewsletterRequest) -> Result<NewsletterSubscriber> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        match self.repo.find_by_email(&email).await? {
            Some(existing) if existing.is_active => {
                Err(AppError::BadRequest("Email is already subscribed".to_string()))
            }
            Some(existing) => {
                tracing::info!("Newsletter subscriber {} reactivated", existing.id);
                self.repo.set_active(existing.id, true).await
            }
            None => match self.repo.create(&email).await {
                Ok(subscriber) => Ok(subscriber),
                Err(e) if e.is_duplicate_on("email") => {
                    Err(AppError::BadRequest("Email is already subscribed".to_string()))
                }
                Err(e) => Err(e),
            },
        }
    }

    pub async fn unsubscribe(&self, request: NewsletterRequest) -> Result<NewsletterSubscriber> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        match self.repo.find_by_email(&email).await? {
            Some(existing) if existing.is_active => self.repo.set_active(existing.id, false).await,
            _ => Err(AppError::NotFound("Email is not subscribed".to_string())),
        }
    }

    pub async fn list_active(&self, limit: i64, offset: i64) -> Result<(Vec<NewsletterSubscriber>, i64)> {
        let subscribers = self.repo.list_active(limit, offset).await?;
        let total = self.repo.count_active().await?;
        Ok((subscribers, total))
    }
}
