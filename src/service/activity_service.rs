use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{ActivityFilter, EventRepository, WorkshopRepository},
};

fn check_schedule(start: chrono::DateTime<Utc>, end: Option<chrono::DateTime<Utc>>) -> Result<()> {
    if validate_schedule(start, end) {
        Ok(())
    } else {
        Err(AppError::Validation("End time must be after start time".to_string()))
    }
}

/// CRUD for events and workshops. Registration lives in `RegistrationService`.
pub struct ActivityService {
    events: Arc<dyn EventRepository>,
    workshops: Arc<dyn WorkshopRepository>,
}

impl ActivityService {
    pub fn new(events: Arc<dyn EventRepository>, workshops: Arc<dyn WorkshopRepository>) -> Self {
        Self { events, workshops }
    }

    pub async fn list_events(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<(Vec<Event>, i64)> {
        let events = self.events.list(filter, limit, offset).await?;
        let total = self.events.count(filter).await?;
        Ok((events, total))
    }

    /// Unpublished events are only visible to admins.
    pub async fn get_event(&self, id: Uuid, include_unpublished: bool) -> Result<Event> {
        match self.events.find_by_id(id).await? {
            Some(event) if event.is_published || include_unpublished => Ok(event),
            _ => Err(AppError::NotFound(ActivityKind::Event.not_found_message())),
        }
    }

    pub async fn create_event(&self, request: EventRequest, created_by: Uuid) -> Result<Event> {
        request.validate()?;
        check_schedule(request.start_time, request.end_time)?;

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            location: request.location,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
            image_url: request.image_url,
            is_published: request.is_published,
            created_by,
            created_at: now,
            updated_at: now,
        };

        let event = self.events.create(event).await?;
        tracing::info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    pub async fn update_event(&self, id: Uuid, request: EventRequest) -> Result<Event> {
        request.validate()?;
        check_schedule(request.start_time, request.end_time)?;

        let existing = self.get_event(id, true).await?;
        let event = Event {
            title: request.title.trim().to_string(),
            description: request.description,
            location: request.location,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
            image_url: request.image_url,
            is_published: request.is_published,
            ..existing
        };

        self.events.update(id, event).await
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<()> {
        self.get_event(id, true).await?;
        self.events.delete(id).await?;
        tracing::info!("Deleted event {}", id);
        Ok(())
    }

    pub async fn list_workshops(&self, filter: ActivityFilter, limit: i64, offset: i64) -> Result<(Vec<Workshop>, i64)> {
        let workshops = self.workshops.list(filter, limit, offset).await?;
        let total = self.workshops.count(filter).await?;
        Ok((workshops, total))
    }

    pub async fn get_workshop(&self, id: Uuid, include_unpublished: bool) -> Result<Workshop> {
        match self.workshops.find_by_id(id).await? {
            Some(workshop) if workshop.is_published || include_unpublished => Ok(workshop),
            _ => Err(AppError::NotFound(ActivityKind::Workshop.not_found_message())),
        }
    }

    pub async fn create_workshop(&self, request: WorkshopRequest, created_by: Uuid) -> Result<Workshop> {
        request.validate()?;
        check_schedule(request.start_time, request.end_time)?;

        let now = Utc::now();
        let workshop = Workshop {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            instructor: request.instructor,
            location: request.location,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
            requires_approval: request.requires_approval,
            image_url: request.image_url,
            is_published: request.is_published,
            created_by,
            created_at: now,
            updated_at: now,
        };

        let workshop = self.workshops.create(workshop).await?;
        tracing::info!("Created workshop {} ({})", workshop.id, workshop.title);
        Ok(workshop)
    }

    pub async fn update_workshop(&self, id: Uuid, request: WorkshopRequest) -> Result<Workshop> {
        request.validate()?;
        check_schedule(request.start_time, request.end_time)?;

        let existing = self.get_workshop(id, true).await?;
        let workshop = Workshop {
            title: request.title.trim().to_string(),
            description: request.description,
            instructor: request.instructor,
            location: request.location,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
            requires_approval: request.requires_approval,
            image_url: request.image_url,
            is_published: request.is_published,
            ..existing
        };

        self.workshops.update(id, workshop).await
    }

    pub async fn delete_workshop(&self, id: Uuid) -> Result<()> {
        self.get_workshop(id, true).await?;
        self.workshops.delete(id).await?;
        tracing::info!("Deleted workshop {}", id);
        Ok(())
    }
}
