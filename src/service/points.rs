use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{Achievement, AwardPolicy},
    error::Result,
    repository::PointsRepository,
};

/// Single entry point for every points change.
pub struct PointsLedger {
    repo: Arc<dyn PointsRepository>,
    policy: AwardPolicy,
}

impl PointsLedger {
    pub fn new(repo: Arc<dyn PointsRepository>, policy: AwardPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> AwardPolicy {
        self.policy
    }

    /// Returns whether points were added.
    pub async fn award(&self, member_id: Uuid, achievement: Achievement) -> Result<bool> {
        let awarded = match self.policy {
            AwardPolicy::AtMostOnce => self.repo.record_once(member_id, achievement).await?,
            AwardPolicy::Unconditional => {
                self.repo.increment(member_id, achievement.points()).await?;
                true
            }
        };

        if awarded {
            tracing::debug!(
                "Awarded {} points to {} for {}",
                achievement.points(),
                member_id,
                achievement.reason()
            );
        } else {
            tracing::debug!("{} already awarded to {} for {}", achievement.reason(), member_id, achievement.entity_id());
        }

        Ok(awarded)
    }

    /// Like `award`, but a failure is logged rather than returned so the
    /// action that earned the points still succeeds.
    pub async fn award_or_log(&self, member_id: Uuid, achievement: Achievement) {
        if let Err(e) = self.award(member_id, achievement).await {
            tracing::error!(
                "Failed to award {} points to {}: {:?}",
                achievement.reason(),
                member_id,
                e
            );
        }
    }
}
