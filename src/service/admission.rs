use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{ActivitySnapshot, NewRegistration, Registration, RegistrationStatus},
    error::{AppError, Result},
    repository::RegistrationRepository,
};

/// Decides whether a member may take a seat at an event or workshop.
pub struct AdmissionGuard {
    registrations: Arc<dyn RegistrationRepository>,
}

impl AdmissionGuard {
    pub fn new(registrations: Arc<dyn RegistrationRepository>) -> Self {
        Self { registrations }
    }

    /// Rejects duplicates first, then full activities. The final insert is
    /// conditional on the active count so the capacity holds under
    /// concurrent admissions.
    pub async fn admit(
        &self,
        activity: &ActivitySnapshot,
        member_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<Registration> {
        if self.registrations.find(activity.kind, activity.id, member_id).await?.is_some() {
            return Err(AppError::BadRequest(activity.kind.already_registered_message()));
        }

        if let Some(capacity) = activity.capacity {
            let active = self.registrations.count_active(activity.kind, activity.id).await?;
            if active >= capacity {
                return Err(AppError::BadRequest(activity.kind.full_message()));
            }
        }

        let new_registration = NewRegistration {
            activity_kind: activity.kind,
            activity_id: activity.id,
            member_id,
            status,
        };

        match self.registrations.insert_if_capacity(new_registration, activity.capacity).await {
            Ok(Some(registration)) => Ok(registration),
            Ok(None) => {
                tracing::info!("{} {} filled up during admission", activity.kind.label(), activity.id);
                Err(AppError::BadRequest(activity.kind.full_message()))
            }
            Err(e) if e.is_duplicate_on("registrations.") => {
                Err(AppError::BadRequest(activity.kind.already_registered_message()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityKind, RegistrationWithMember};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports a free seat, then answers the insert with a fixed outcome, as
    /// if another admission landed between the count and the write.
    struct RacedRegistrations {
        on_insert: fn() -> Result<Option<Registration>>,
        inserts: AtomicUsize,
    }

    impl RacedRegistrations {
        fn new(on_insert: fn() -> Result<Option<Registration>>) -> Arc<Self> {
            Arc::new(Self { on_insert, inserts: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl RegistrationRepository for RacedRegistrations {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Registration>> {
            unimplemented!()
        }

        async fn find(&self, _kind: ActivityKind, _activity_id: Uuid, _member_id: Uuid) -> Result<Option<Registration>> {
            Ok(None)
        }

        async fn count_active(&self, _kind: ActivityKind, _activity_id: Uuid) -> Result<i64> {
            Ok(0)
        }

        async fn insert_if_capacity(&self, _registration: NewRegistration, _capacity: Option<i64>) -> Result<Option<Registration>> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            (self.on_insert)()
        }

        async fn update_status(&self, _id: Uuid, _status: RegistrationStatus) -> Result<Registration> {
            unimplemented!()
        }

        async fn list_for_activity(&self, _kind: ActivityKind, _activity_id: Uuid) -> Result<Vec<RegistrationWithMember>> {
            unimplemented!()
        }

        async fn list_for_member(&self, _member_id: Uuid) -> Result<Vec<Registration>> {
            unimplemented!()
        }
    }

    fn event(capacity: Option<i64>) -> ActivitySnapshot {
        ActivitySnapshot {
            kind: ActivityKind::Event,
            id: Uuid::new_v4(),
            title: "Rust meetup".to_string(),
            capacity,
            requires_approval: false,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_seat_taken_between_count_and_insert_is_full() {
        let repo = RacedRegistrations::new(|| Ok(None));
        let guard = AdmissionGuard::new(repo.clone());

        let result = guard.admit(&event(Some(1)), Uuid::new_v4(), RegistrationStatus::Confirmed).await;

        match result {
            Err(AppError::BadRequest(message)) => assert_eq!(message, "Event is full"),
            other => panic!("expected full event, got {:?}", other),
        }
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unique_violation_on_insert_is_already_registered() {
        let repo = RacedRegistrations::new(|| {
            Err(AppError::DuplicateKey(
                "UNIQUE constraint failed: registrations.activity_kind, registrations.activity_id, registrations.member_id"
                    .to_string(),
            ))
        });
        let guard = AdmissionGuard::new(repo);

        let result = guard.admit(&event(None), Uuid::new_v4(), RegistrationStatus::Confirmed).await;

        match result {
            Err(AppError::BadRequest(message)) => assert_eq!(message, "Already registered for this event"),
            other => panic!("expected duplicate registration, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_insert_errors_pass_through() {
        let repo = RacedRegistrations::new(|| Err(AppError::Database("disk I/O error".to_string())));
        let guard = AdmissionGuard::new(repo);

        let result = guard.admit(&event(Some(10)), Uuid::new_v4(), RegistrationStatus::Pending).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
