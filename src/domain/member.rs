use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    /// Display identifier such as `DAIC-CSE-00001`. `None` until allocated.
    pub unique_id: Option<String>,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub role: MemberRole,
    pub is_verified: bool,
    pub points: i64,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "MEMBER",
            MemberRole::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MEMBER" => Some(MemberRole::Member),
            "ADMIN" => Some(MemberRole::Admin),
            _ => None,
        }
    }
}

/// When a member receives their display identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignIdOn {
    #[default]
    Registration,
    Verification,
}

/// Row-level data for inserting a member. Password is already hashed.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub role: MemberRole,
    pub is_verified: bool,
    pub unique_id: Option<String>,
    pub verification_token_hash: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 16, message = "Department code is too long"))]
    pub department: Option<String>,
    #[validate(range(min = 1, max = 6, message = "Year must be between 1 and 6"))]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Verification token is required"))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 6, message = "Year must be between 1 and 6"))]
    pub year: Option<i32>,
    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
    #[validate(url(message = "GitHub URL must be a valid URL"))]
    pub github_url: Option<String>,
    #[validate(url(message = "LinkedIn URL must be a valid URL"))]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub member_id: Uuid,
    pub unique_id: Option<String>,
    pub name: String,
    pub department: Option<String>,
    pub avatar_url: Option<String>,
    pub points: i64,
}

/// What other members see of a profile. Omits the email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: Uuid,
    pub unique_id: Option<String>,
    pub name: String,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub points: i64,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberProfile {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            unique_id: member.unique_id,
            name: member.name,
            department: member.department,
            year: member.year,
            points: member.points,
            bio: member.bio,
            avatar_url: member.avatar_url,
            github_url: member.github_url,
            linkedin_url: member.linkedin_url,
            created_at: member.created_at,
        }
    }
}
