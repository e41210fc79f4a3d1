use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    types::{LeaveTypeId, OrganizationId},
    validation::rules::{validate_hex_color, validate_not_blank},
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveType {
    pub id: LeaveTypeId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub color: String,
    /// Approved requests of this type consume the yearly balance.
    pub deducts_balance: bool,
    pub requires_approval: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Leave types seeded for every new organization.
pub const DEFAULT_LEAVE_TYPES: &[(&str, &str, bool, bool)] = &[
    ("Annual leave", "#2E7D32", true, true),
    ("Sick leave", "#C62828", false, false),
    ("Unpaid leave", "#6D6D6D", false, true),
];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeaveType {
    #[validate(length(min = 1, max = 60), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    #[serde(default = "default_true")]
    pub deducts_balance: bool,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLeaveType {
    #[validate(length(min = 1, max = 60), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    pub deducts_balance: Option<bool>,
    pub requires_approval: Option<bool>,
    /// Leave types are deactivated rather than deleted.
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_deducting_and_approval() {
        let payload: CreateLeaveType =
            serde_json::from_str(r##"{"name":"Study","color":"#123456"}"##).unwrap();
        assert!(payload.deducts_balance);
        assert!(payload.requires_approval);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn create_rejects_bad_color() {
        let payload: CreateLeaveType =
            serde_json::from_str(r#"{"name":"Study","color":"blue"}"#).unwrap();
        assert!(payload.validate().is_err());
    }
}
