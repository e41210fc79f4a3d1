use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    types::{LeaveRequestId, LeaveTypeId, OrganizationId, TeamId, UserId},
    validation::rules::validate_decision_comment,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub leave_type_id: LeaveTypeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_day: bool,
    /// Working days covered, fixed when the request is created.
    pub days: f64,
    pub reason: Option<String>,
    pub status: LeaveRequestStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_comment: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveRequestStatus::Pending => "pending",
            LeaveRequestStatus::Approved => "approved",
            LeaveRequestStatus::Rejected => "rejected",
            LeaveRequestStatus::Cancelled => "cancelled",
        }
    }
}

impl LeaveRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organization_id: OrganizationId,
        user_id: UserId,
        leave_type_id: LeaveTypeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        half_day: bool,
        days: f64,
        reason: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: LeaveRequestId::new(),
            organization_id,
            user_id,
            leave_type_id,
            start_date,
            end_date,
            half_day,
            days,
            reason,
            status: LeaveRequestStatus::Pending,
            decided_by: None,
            decided_at: None,
            decision_comment: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Owners may cancel pending requests and approved ones that have not started.
    pub fn owner_can_cancel(&self, today: NaiveDate) -> bool {
        match self.status {
            LeaveRequestStatus::Pending => true,
            LeaveRequestStatus::Approved => self.start_date > today,
            LeaveRequestStatus::Rejected | LeaveRequestStatus::Cancelled => false,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_leave_request"))]
pub struct CreateLeaveRequest {
    pub leave_type_id: LeaveTypeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

fn validate_create_leave_request(payload: &CreateLeaveRequest) -> Result<(), ValidationError> {
    if payload.start_date > payload.end_date {
        return Err(ValidationError::new("start_after_end"));
    }
    if payload.half_day && payload.start_date != payload.end_date {
        return Err(ValidationError::new("half_day_requires_single_day"));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct DecisionPayload {
    #[validate(custom(function = "validate_decision_comment"))]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveRequestListQuery {
    pub status: Option<LeaveRequestStatus>,
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Flattened row used by the CSV export.
#[derive(Debug, FromRow)]
pub struct LeaveRequestExportRow {
    pub id: LeaveRequestId,
    pub email: String,
    pub full_name: String,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: f64,
    pub status: LeaveRequestStatus,
    pub reason: Option<String>,
    pub decision_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
