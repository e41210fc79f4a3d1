use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    types::{OrganizationId, TeamId, UserId},
    validation::rules::validate_not_blank,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub id: TeamId,
    pub organization_id: OrganizationId,
    pub name: String,
    /// Manager who approves leave for the team's members.
    pub manager_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TeamWithMembers {
    pub id: TeamId,
    pub name: String,
    pub manager_id: Option<UserId>,
    pub member_count: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TeamPayload {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub name: String,
    pub manager_id: Option<UserId>,
}
