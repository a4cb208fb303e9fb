use std::sync::Arc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::AttendanceSigner,
    domain::*,
    error::{AppError, Result},
    media::qr,
    repository::{EventRepository, RegistrationRepository, WorkshopRepository},
    service::{admission::AdmissionGuard, points::PointsLedger},
};

/// What a member shows at the door.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceQr {
    pub registration_id: Uuid,
    pub token: String,
    pub svg: String,
    pub data_url: String,
}

fn registered_achievement(kind: ActivityKind, activity_id: Uuid) -> Achievement {
    match kind {
        ActivityKind::Event => Achievement::EventRegistered { event_id: activity_id },
        ActivityKind::Workshop => Achievement::WorkshopRegistered { workshop_id: activity_id },
    }
}

fn attended_achievement(kind: ActivityKind, activity_id: Uuid) -> Achievement {
    match kind {
        ActivityKind::Event => Achievement::EventAttended { event_id: activity_id },
        ActivityKind::Workshop => Achievement::WorkshopCompleted { workshop_id: activity_id },
    }
}

pub struct RegistrationService {
    events: Arc<dyn EventRepository>,
    workshops: Arc<dyn WorkshopRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    guard: AdmissionGuard,
    points: Arc<PointsLedger>,
    signer: AttendanceSigner,
}

impl RegistrationService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        workshops: Arc<dyn WorkshopRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        points: Arc<PointsLedger>,
        signer: AttendanceSigner,
    ) -> Self {
        Self {
            events,
            workshops,
            guard: AdmissionGuard::new(registrations.clone()),
            registrations,
            points,
            signer,
        }
    }

    async fn snapshot(&self, kind: ActivityKind, activity_id: Uuid) -> Result<ActivitySnapshot> {
        let snapshot = match kind {
            ActivityKind::Event => self.events
                .find_by_id(activity_id)
                .await?
                .map(|event| ActivitySnapshot::from(&event)),
            ActivityKind::Workshop => self.workshops
                .find_by_id(activity_id)
                .await?
                .map(|workshop| ActivitySnapshot::from(&workshop)),
        };

        snapshot.ok_or_else(|| AppError::NotFound(kind.not_found_message()))
    }

    async fn require_registration(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<Registration> {
        self.registrations
            .find(kind, activity_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))
    }

    /// Workshops that need approval start PENDING, everything else CONFIRMED.
    pub async fn register(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<Registration> {
        let activity = self.snapshot(kind, activity_id).await?;
        if !activity.is_published {
            return Err(AppError::NotFound(kind.not_found_message()));
        }

        let status = if activity.requires_approval {
            RegistrationStatus::Pending
        } else {
            RegistrationStatus::Confirmed
        };

        let registration = self.guard.admit(&activity, member_id, status).await?;
        tracing::info!(
            "Member {} registered for {} {} ({})",
            member_id,
            kind.label().to_lowercase(),
            activity_id,
            registration.status.as_str()
        );

        self.points.award_or_log(member_id, registered_achievement(kind, activity_id)).await;

        Ok(registration)
    }

    pub async fn cancel(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<Registration> {
        let registration = self.require_registration(kind, activity_id, member_id).await?;

        if !registration.status.can_transition_to(RegistrationStatus::Cancelled) {
            return Err(AppError::BadRequest(format!(
                "A {} registration cannot be cancelled",
                registration.status.as_str().to_lowercase()
            )));
        }

        self.registrations.update_status(registration.id, RegistrationStatus::Cancelled).await
    }

    /// Admin approval of a PENDING workshop seat.
    pub async fn confirm(&self, workshop_id: Uuid, member_id: Uuid) -> Result<Registration> {
        self.snapshot(ActivityKind::Workshop, workshop_id).await?;
        let registration = self.require_registration(ActivityKind::Workshop, workshop_id, member_id).await?;

        if !registration.status.can_transition_to(RegistrationStatus::Confirmed) {
            return Err(AppError::BadRequest("Only pending registrations can be confirmed".to_string()));
        }

        self.registrations.update_status(registration.id, RegistrationStatus::Confirmed).await
    }

    /// The signed QR code for a member's confirmed registration.
    pub async fn attendance_qr(&self, kind: ActivityKind, activity_id: Uuid, member_id: Uuid) -> Result<AttendanceQr> {
        let registration = self.require_registration(kind, activity_id, member_id).await?;

        match registration.status {
            RegistrationStatus::Confirmed => {}
            RegistrationStatus::Pending => {
                return Err(AppError::BadRequest("Registration is awaiting approval".to_string()));
            }
            RegistrationStatus::Cancelled => {
                return Err(AppError::BadRequest("Registration was cancelled".to_string()));
            }
            RegistrationStatus::Attended => {
                return Err(AppError::BadRequest("Attendance already recorded".to_string()));
            }
        }

        let token = self.signer.sign(registration.id)?;
        let svg = qr::render_svg(&token)?;
        let data_url = qr::svg_data_url(&svg);

        Ok(AttendanceQr {
            registration_id: registration.id,
            token,
            svg,
            data_url,
        })
    }

    /// Records attendance from a scanned QR token. For workshops this is
    /// completion.
    pub async fn mark_attendance(&self, kind: ActivityKind, token: &str) -> Result<Registration> {
        let registration_id = self.signer
            .verify(token)?
            .ok_or_else(|| AppError::BadRequest("Invalid attendance code".to_string()))?;

        let registration = self.registrations
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;

        if registration.activity_kind != kind {
            return Err(AppError::BadRequest(format!(
                "Attendance code is not for this {}",
                kind.label().to_lowercase()
            )));
        }

        match registration.status {
            RegistrationStatus::Confirmed => {}
            RegistrationStatus::Attended => {
                return Err(AppError::BadRequest("Attendance already recorded".to_string()));
            }
            RegistrationStatus::Pending | RegistrationStatus::Cancelled => {
                return Err(AppError::BadRequest("Registration is not confirmed".to_string()));
            }
        }

        let updated = self.registrations.update_status(registration.id, RegistrationStatus::Attended).await?;
        tracing::info!(
            "Attendance recorded for member {} at {} {}",
            updated.member_id,
            kind.label().to_lowercase(),
            updated.activity_id
        );

        self.points
            .award_or_log(updated.member_id, attended_achievement(kind, updated.activity_id))
            .await;

        Ok(updated)
    }

    pub async fn list_for_activity(&self, kind: ActivityKind, activity_id: Uuid) -> Result<Vec<RegistrationWithMember>> {
        self.snapshot(kind, activity_id).await?;
        self.registrations.list_for_activity(kind, activity_id).await
    }

    pub async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<Registration>> {
        self.registrations.list_for_member(member_id).await
    }
}
