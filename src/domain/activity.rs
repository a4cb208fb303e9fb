use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Events and workshops share one registration table, told apart by kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Event,
    Workshop,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Event => "EVENT",
            ActivityKind::Workshop => "WORKSHOP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EVENT" => Some(ActivityKind::Event),
            "WORKSHOP" => Some(ActivityKind::Workshop),
            _ => None,
        }
    }

    /// Capitalised noun for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Event => "Event",
            ActivityKind::Workshop => "Workshop",
        }
    }

    pub fn full_message(&self) -> String {
        format!("{} is full", self.label())
    }

    pub fn already_registered_message(&self) -> String {
        format!("Already registered for this {}", self.label().to_lowercase())
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    pub capacity: Option<i64>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workshop {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
    /// Registrations start as PENDING and need an admin to confirm them.
    pub requires_approval: bool,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The parts of an event or workshop that admission cares about.
#[derive(Debug, Clone)]
pub struct ActivitySnapshot {
    pub kind: ActivityKind,
    pub id: Uuid,
    pub title: String,
    pub capacity: Option<i64>,
    pub requires_approval: bool,
    pub is_published: bool,
}

impl From<&Event> for ActivitySnapshot {
    fn from(event: &Event) -> Self {
        Self {
            kind: ActivityKind::Event,
            id: event.id,
            title: event.title.clone(),
            capacity: event.capacity,
            requires_approval: false,
            is_published: event.is_published,
        }
    }
}

impl From<&Workshop> for ActivitySnapshot {
    fn from(workshop: &Workshop) -> Self {
        Self {
            kind: ActivityKind::Workshop,
            id: workshop.id,
            title: workshop.title.clone(),
            capacity: workshop.capacity,
            requires_approval: workshop.requires_approval,
            is_published: workshop.is_published,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "PENDING",
            RegistrationStatus::Confirmed => "CONFIRMED",
            RegistrationStatus::Cancelled => "CANCELLED",
            RegistrationStatus::Attended => "ATTENDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(RegistrationStatus::Pending),
            "CONFIRMED" => Some(RegistrationStatus::Confirmed),
            "CANCELLED" => Some(RegistrationStatus::Cancelled),
            "ATTENDED" => Some(RegistrationStatus::Attended),
            _ => None,
        }
    }

    /// Counts against capacity.
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }

    /// Statuses only move forward; CANCELLED and ATTENDED are terminal.
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Attended) | (Confirmed, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub activity_kind: ActivityKind,
    pub activity_id: Uuid,
    pub member_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub attended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub activity_kind: ActivityKind,
    pub activity_id: Uuid,
    pub member_id: Uuid,
    pub status: RegistrationStatus,
}

/// Registration joined with the member it belongs to, for admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationWithMember {
    #[serde(flatten)]
    pub registration: Registration,
    pub member_name: String,
    pub member_email: String,
    pub member_unique_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i64>,
    pub image_url: Option<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkshopRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub instructor: Option<String>,
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub requires_approval: bool,
    pub image_url: Option<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

/// End must not precede start.
pub fn validate_schedule(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    end.map(|end| end >= start).unwrap_or(true)
}
