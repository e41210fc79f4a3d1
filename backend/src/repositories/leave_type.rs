use chrono::Utc;
use sqlx::PgExecutor;

use crate::{
    models::leave_type::LeaveType,
    types::{LeaveTypeId, OrganizationId},
};

const LEAVE_TYPE_COLUMNS: &str = "id, organization_id, name, color, deducts_balance, \
     requires_approval, is_active, created_at, updated_at";

pub async fn list_leave_types(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    active_only: bool,
) -> Result<Vec<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(&format!(
        "SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types \
         WHERE organization_id = $1 AND ($2 = FALSE OR is_active) ORDER BY name"
    ))
    .bind(organization_id)
    .bind(active_only)
    .fetch_all(db)
    .await
}

pub async fn find_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    id: LeaveTypeId,
) -> Result<Option<LeaveType>, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(&format!(
        "SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE id = $1 AND organization_id = $2"
    ))
    .bind(id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_leave_type(
    db: impl PgExecutor<'_>,
    leave_type: &LeaveType,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO leave_types (id, organization_id, name, color, deducts_balance, \
         requires_approval, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(leave_type.id)
    .bind(leave_type.organization_id)
    .bind(&leave_type.name)
    .bind(&leave_type.color)
    .bind(leave_type.deducts_balance)
    .bind(leave_type.requires_approval)
    .bind(leave_type.is_active)
    .bind(leave_type.created_at)
    .bind(leave_type.updated_at)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn update_leave_type(
    db: impl PgExecutor<'_>,
    leave_type: &LeaveType,
) -> Result<LeaveType, sqlx::Error> {
    sqlx::query_as::<_, LeaveType>(&format!(
        "UPDATE leave_types SET name = $2, color = $3, deducts_balance = $4, \
         requires_approval = $5, is_active = $6, updated_at = $7 WHERE id = $1 \
         RETURNING {LEAVE_TYPE_COLUMNS}"
    ))
    .bind(leave_type.id)
    .bind(&leave_type.name)
    .bind(&leave_type.color)
    .bind(leave_type.deducts_balance)
    .bind(leave_type.requires_approval)
    .bind(leave_type.is_active)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}
