//! Models that represent users, authentication payloads, and role metadata.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    types::{OrganizationId, TeamId, UserId},
    utils::password::validate_password_strength,
};

#[derive(Debug, Clone, FromRow)]
/// Database representation of an organization member.
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    /// Lowercased login email, unique across tenants.
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub team_id: Option<TeamId>,
    /// Day on which a pending removal takes effect.
    pub removal_effective_at: Option<NaiveDate>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    #[default]
    Employee,
    /// Approves leave for their team.
    Manager,
    /// Manages the organization, users and billing.
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(UserRole::Employee),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["employee", "manager", "admin"],
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    /// Still has access and occupies a seat until `removal_effective_at`.
    PendingRemoval,
    Archived,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::PendingRemoval => "pending_removal",
            UserStatus::Archived => "archived",
        }
    }
}

impl User {
    pub fn new(
        organization_id: OrganizationId,
        email: &str,
        password_hash: String,
        full_name: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            organization_id,
            email: normalize_email(email),
            password_hash,
            full_name,
            role,
            status: UserStatus::Active,
            team_id: None,
            removal_effective_at: None,
            archived_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self.role, UserRole::Manager | UserRole::Admin)
    }

    pub fn can_sign_in(&self) -> bool {
        matches!(self.status, UserStatus::Active | UserStatus::PendingRemoval)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub team_id: Option<TeamId>,
    pub removal_effective_at: Option<NaiveDate>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            organization_id: user.organization_id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            status: user.status,
            team_id: user.team_id,
            removal_effective_at: user.removal_effective_at,
            archived_at: user.archived_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Admin edit of a member. `team_id: null` clears the team.
pub struct UpdateUser {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    #[schema(value_type = Option<String>)]
    pub team_id: Option<Option<TeamId>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ScheduleRemovalRequest {
    /// Defaults to the subscription renewal date, or today without one.
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub status: Option<UserStatus>,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Authentication tokens returned after a successful login.
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}
