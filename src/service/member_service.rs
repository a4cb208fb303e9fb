use std::sync::Arc;
use uuid::Uuid;
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    auth::{generate_token, hash_token, AuthService},
    domain::*,
    email::{verification_email, EmailSender},
    error::{AppError, Result},
    repository::MemberRepository,
    service::member_id::MemberIdAllocator,
};

/// How many times allocate-and-write is attempted when another request
/// claims the same member id first.
const ID_WRITE_ROUNDS: usize = 3;

pub const DEFAULT_LEADERBOARD_SIZE: i64 = 10;
pub const MAX_LEADERBOARD_SIZE: i64 = 100;

/// Outcome of a successful sign-up. The raw verification token only exists
/// here and in the outgoing email.
#[derive(Debug, Clone)]
pub struct Registered {
    pub member: Member,
    pub verification_token: String,
}

pub struct MemberService {
    repo: Arc<dyn MemberRepository>,
    allocator: MemberIdAllocator,
    auth_service: Arc<AuthService>,
    mailer: Arc<dyn EmailSender>,
    assign_id_on: AssignIdOn,
    base_url: String,
    verification_token_hours: i64,
}

impl MemberService {
    pub fn new(
        repo: Arc<dyn MemberRepository>,
        allocator: MemberIdAllocator,
        auth_service: Arc<AuthService>,
        mailer: Arc<dyn EmailSender>,
        assign_id_on: AssignIdOn,
        base_url: String,
        verification_token_hours: i64,
    ) -> Self {
        Self {
            repo,
            allocator,
            auth_service,
            mailer,
            assign_id_on,
            base_url,
            verification_token_hours,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Registered> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;
        let department = request.department
            .as_deref()
            .map(|d| d.trim().to_uppercase())
            .filter(|d| !d.is_empty());

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.verification_token_hours);

        let mut round = 0;
        let member = loop {
            round += 1;

            let unique_id = match self.assign_id_on {
                AssignIdOn::Registration => Some(self.allocator.allocate(department.as_deref()).await?),
                AssignIdOn::Verification => None,
            };

            let new_member = NewMember {
                name: request.name.trim().to_string(),
                email: email.clone(),
                password_hash: password_hash.clone(),
                department: department.clone(),
                year: request.year,
                role: MemberRole::Member,
                is_verified: false,
                unique_id,
                verification_token_hash: Some(hash_token(&token)),
                verification_expires_at: Some(expires_at),
            };

            match self.repo.create(new_member).await {
                Ok(member) => break member,
                Err(e) if e.is_duplicate_on("unique_id") && round < ID_WRITE_ROUNDS => {
                    tracing::warn!("Member id collided on insert, retrying (round {})", round);
                }
                Err(e) if e.is_duplicate_on("email") => {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!("Registered member {} ({:?})", member.id, member.unique_id);
        self.send_verification(&member, &token).await;

        Ok(Registered { member, verification_token: token })
    }

    pub async fn verify_email(&self, token: &str) -> Result<Member> {
        let invalid = || AppError::BadRequest("Invalid or expired verification token".to_string());

        let (member, expires_at) = self.repo
            .find_by_verification_token(&hash_token(token.trim()))
            .await?
            .ok_or_else(invalid)?;

        if expires_at.map(|at| at <= Utc::now()).unwrap_or(true) {
            return Err(invalid());
        }

        // The token is only consumed once the member holds an id, so a failed
        // assignment can be retried with the same link.
        if self.assign_id_on == AssignIdOn::Verification && member.unique_id.is_none() {
            self.assign_member_id(&member).await?;
        }

        let member = self.repo.mark_verified(member.id).await?;
        tracing::info!("Member {} verified their email", member.id);

        Ok(member)
    }

    /// Issues a fresh verification token for an unverified account.
    pub async fn resend_verification(&self, email: &str) -> Result<String> {
        let member = self.repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound("No account found for that email".to_string()))?;

        if member.is_verified {
            return Err(AppError::BadRequest("Email is already verified".to_string()));
        }

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(self.verification_token_hours);
        self.repo.set_verification_token(member.id, &hash_token(&token), expires_at).await?;

        self.send_verification(&member, &token).await;
        Ok(token)
    }

    /// Checks credentials. Unverified members are refused.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Member> {
        let unauthorized = || AppError::Unauthorized("Invalid email or password".to_string());

        let member = self.repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(unauthorized)?;

        let hash = self.repo.password_hash(member.id).await?.ok_or_else(unauthorized)?;
        if !AuthService::verify_password(password, &hash).await? {
            return Err(unauthorized());
        }

        if !member.is_verified {
            return Err(AppError::Forbidden("Please verify your email before logging in".to_string()));
        }

        Ok(member)
    }

    /// Changes the password and signs the member out everywhere.
    pub async fn change_password(&self, id: Uuid, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let hash = self.repo
            .password_hash(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

        if !AuthService::verify_password(&request.current_password, &hash).await? {
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }

        let new_hash = AuthService::hash_password(&request.new_password).await?;
        self.repo.update_password_hash(id, &new_hash).await?;
        self.auth_service.invalidate_member_sessions(id).await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Member> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))
    }

    pub async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Member>, i64)> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let members = self.repo.list(search, limit, offset).await?;
        let total = self.repo.count(search).await?;
        Ok((members, total))
    }

    pub async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<Member> {
        update.validate()?;
        self.repo.update_profile(id, update).await
    }

    pub async fn set_role(&self, actor: &Member, id: Uuid, role: MemberRole) -> Result<Member> {
        if actor.id == id {
            return Err(AppError::BadRequest("You cannot change your own role".to_string()));
        }

        let member = self.repo.update_role(id, role).await?;
        tracing::info!("{} set role of {} to {}", actor.id, id, role.as_str());
        Ok(member)
    }

    pub async fn delete(&self, actor: &Member, id: Uuid) -> Result<()> {
        if actor.id == id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }

        self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("{} deleted member {}", actor.id, id);
        Ok(())
    }

    /// Verified members by points, earliest sign-up first on ties.
    pub async fn leaderboard(&self, limit: Option<i64>) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE).clamp(1, MAX_LEADERBOARD_SIZE);
        let members = self.repo.leaderboard(limit).await?;

        Ok(members
            .into_iter()
            .enumerate()
            .map(|(index, member)| LeaderboardEntry {
                rank: index + 1,
                member_id: member.id,
                unique_id: member.unique_id,
                name: member.name,
                department: member.department,
                avatar_url: member.avatar_url,
                points: member.points,
            })
            .collect())
    }

    async fn assign_member_id(&self, member: &Member) -> Result<Member> {
        let mut round = 0;
        loop {
            round += 1;
            let unique_id = self.allocator.allocate(member.department.as_deref()).await?;

            match self.repo.assign_unique_id(member.id, &unique_id).await {
                Ok(updated) => {
                    tracing::info!("Assigned member id {} to {}", unique_id, member.id);
                    return Ok(updated);
                }
                Err(e) if e.is_duplicate_on("unique_id") && round < ID_WRITE_ROUNDS => {
                    tracing::warn!("Member id {} taken on assignment, retrying", unique_id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_verification(&self, member: &Member, token: &str) {
        let email = verification_email(
            &self.base_url,
            &member.name,
            &member.email,
            token,
            self.verification_token_hours,
        );

        if let Err(e) = self.mailer.send(email).await {
            tracing::error!(
                "Failed to send verification email via {} to {}: {:?}",
                self.mailer.name(),
                member.id,
                e
            );
        }
    }
}
