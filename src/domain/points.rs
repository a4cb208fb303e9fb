use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something a member did that earns points. Each variant carries the id of
/// the entity that triggered it so the ledger can key awards on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    BlogSubmitted { blog_id: Uuid },
    BlogApproved { blog_id: Uuid },
    EventRegistered { event_id: Uuid },
    EventAttended { event_id: Uuid },
    WorkshopRegistered { workshop_id: Uuid },
    WorkshopCompleted { workshop_id: Uuid },
    ProjectSubmitted { project_id: Uuid },
    ProjectApproved { project_id: Uuid },
}

impl Achievement {
    pub fn points(&self) -> i64 {
        match self {
            Achievement::BlogSubmitted { .. } => 10,
            Achievement::BlogApproved { .. } => 20,
            Achievement::EventRegistered { .. } => 5,
            Achievement::EventAttended { .. } => 10,
            Achievement::WorkshopRegistered { .. } => 5,
            Achievement::WorkshopCompleted { .. } => 30,
            Achievement::ProjectSubmitted { .. } => 15,
            Achievement::ProjectApproved { .. } => 25,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Achievement::BlogSubmitted { .. } => "BLOG_SUBMITTED",
            Achievement::BlogApproved { .. } => "BLOG_APPROVED",
            Achievement::EventRegistered { .. } => "EVENT_REGISTERED",
            Achievement::EventAttended { .. } => "EVENT_ATTENDED",
            Achievement::WorkshopRegistered { .. } => "WORKSHOP_REGISTERED",
            Achievement::WorkshopCompleted { .. } => "WORKSHOP_COMPLETED",
            Achievement::ProjectSubmitted { .. } => "PROJECT_SUBMITTED",
            Achievement::ProjectApproved { .. } => "PROJECT_APPROVED",
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match *self {
            Achievement::BlogSubmitted { blog_id } | Achievement::BlogApproved { blog_id } => blog_id,
            Achievement::EventRegistered { event_id } | Achievement::EventAttended { event_id } => event_id,
            Achievement::WorkshopRegistered { workshop_id }
            | Achievement::WorkshopCompleted { workshop_id } => workshop_id,
            Achievement::ProjectSubmitted { project_id }
            | Achievement::ProjectApproved { project_id } => project_id,
        }
    }
}

/// Whether repeating a trigger awards points again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AwardPolicy {
    /// One award per (member, reason, entity).
    #[default]
    AtMostOnce,
    /// Every trigger increments, even repeats.
    Unconditional,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_table() {
        let id = Uuid::new_v4();
        assert_eq!(Achievement::BlogSubmitted { blog_id: id }.points(), 10);
        assert_eq!(Achievement::BlogApproved { blog_id: id }.points(), 20);
        assert_eq!(Achievement::EventRegistered { event_id: id }.points(), 5);
        assert_eq!(Achievement::EventAttended { event_id: id }.points(), 10);
        assert_eq!(Achievement::WorkshopRegistered { workshop_id: id }.points(), 5);
        assert_eq!(Achievement::WorkshopCompleted { workshop_id: id }.points(), 30);
        assert_eq!(Achievement::ProjectSubmitted { project_id: id }.points(), 15);
        assert_eq!(Achievement::ProjectApproved { project_id: id }.points(), 25);
    }

    #[test]
    fn test_entity_and_reason() {
        let id = Uuid::new_v4();
        let achievement = Achievement::WorkshopCompleted { workshop_id: id };
        assert_eq!(achievement.entity_id(), id);
        assert_eq!(achievement.reason(), "WORKSHOP_COMPLETED");
    }
}
