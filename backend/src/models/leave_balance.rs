use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{LeaveBalanceId, LeaveTypeId, OrganizationId, UserId};

#[derive(Debug, Clone, FromRow)]
pub struct LeaveBalance {
    pub id: LeaveBalanceId,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub leave_type_id: LeaveTypeId,
    /// Leave year label: the calendar year in which the leave year started.
    pub year: i32,
    pub allocated_days: f64,
    pub carried_over_days: f64,
    pub used_days: f64,
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    pub fn remaining(&self) -> f64 {
        self.allocated_days + self.carried_over_days - self.used_days
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LeaveBalanceResponse {
    pub id: LeaveBalanceId,
    pub user_id: UserId,
    pub leave_type_id: LeaveTypeId,
    pub leave_type_name: String,
    pub year: i32,
    pub allocated_days: f64,
    pub carried_over_days: f64,
    pub used_days: f64,
    /// Days requested but not yet decided.
    pub pending_days: f64,
    pub remaining_days: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustLeaveBalance {
    #[validate(range(min = 0.0, max = 365.0))]
    pub allocated_days: Option<f64>,
    #[validate(range(min = 0.0, max = 365.0))]
    pub carried_over_days: Option<f64>,
}
