use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    models::user::UserRole,
    types::{InvitationId, OrganizationId, TeamId, UserId},
    utils::password::validate_password_strength,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

#[derive(Debug, Clone, FromRow)]
pub struct Invitation {
    pub id: InvitationId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub role: UserRole,
    pub team_id: Option<TeamId>,
    /// SHA-256 of the token mailed to the invitee; the token itself is never stored.
    pub token_hash: String,
    pub status: InvitationStatus,
    pub invited_by: Option<UserId>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Open invitations hold a seat.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at > now
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvitationResponse {
    pub id: InvitationId,
    pub email: String,
    pub role: UserRole,
    pub team_id: Option<TeamId>,
    pub status: InvitationStatus,
    pub invited_by: Option<UserId>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(inv: Invitation) -> Self {
        Self {
            id: inv.id,
            email: inv.email,
            role: inv.role,
            team_id: inv.team_id,
            status: inv.status,
            invited_by: inv.invited_by,
            expires_at: inv.expires_at,
            created_at: inv.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvitation {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AcceptInvitation {
    #[validate(length(min = 20, max = 128))]
    pub token: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}
