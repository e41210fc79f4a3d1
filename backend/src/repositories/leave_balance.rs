use chrono::{NaiveDate, Utc};
use sqlx::PgExecutor;

use crate::{
    models::leave_balance::{LeaveBalance, LeaveBalanceResponse},
    types::{LeaveBalanceId, LeaveTypeId, OrganizationId, UserId},
};

const BALANCE_COLUMNS: &str = "id, organization_id, user_id, leave_type_id, year, allocated_days, \
     carried_over_days, used_days, updated_at";

/// Creates missing balances for every active balance-deducting leave type.
pub async fn ensure_balances_for_user(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
    year: i32,
    allocated_days: f64,
) -> Result<u64, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO leave_balances (id, organization_id, user_id, leave_type_id, year,
            allocated_days, carried_over_days, used_days, updated_at)
        SELECT gen_random_uuid()::TEXT, $1, $2, lt.id, $3, $4, 0, 0, NOW()
        FROM leave_types lt
        WHERE lt.organization_id = $1 AND lt.is_active AND lt.deducts_balance
        ON CONFLICT (user_id, leave_type_id, year) DO NOTHING
        "#,
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(year)
    .bind(allocated_days)
    .execute(db)
    .await
    .map(|result| result.rows_affected())
}

pub async fn find_for_update(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    leave_type_id: LeaveTypeId,
    year: i32,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances \
         WHERE user_id = $1 AND leave_type_id = $2 AND year = $3 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .fetch_optional(db)
    .await
}

pub async fn find_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    id: LeaveBalanceId,
) -> Result<Option<LeaveBalance>, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE id = $1 AND organization_id = $2"
    ))
    .bind(id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

/// Balances for one leave year with pending days inside that year.
pub async fn list_for_user(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    year: i32,
    year_start: NaiveDate,
    year_end: NaiveDate,
) -> Result<Vec<LeaveBalanceResponse>, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalanceResponse>(
        r#"
        SELECT b.id, b.user_id, b.leave_type_id, lt.name AS leave_type_name, b.year,
               b.allocated_days, b.carried_over_days, b.used_days,
               COALESCE((
                   SELECT SUM(r.days) FROM leave_requests r
                   WHERE r.user_id = b.user_id AND r.leave_type_id = b.leave_type_id
                     AND r.status = 'pending' AND r.start_date BETWEEN $3 AND $4
               ), 0)::DOUBLE PRECISION AS pending_days,
               (b.allocated_days + b.carried_over_days - b.used_days) AS remaining_days
        FROM leave_balances b
        JOIN leave_types lt ON lt.id = b.leave_type_id
        WHERE b.user_id = $1 AND b.year = $2
        ORDER BY lt.name
        "#,
    )
    .bind(user_id)
    .bind(year)
    .bind(year_start)
    .bind(year_end)
    .fetch_all(db)
    .await
}

/// Sum of pending request days that would draw from the same balance.
pub async fn pending_days(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    leave_type_id: LeaveTypeId,
    year_start: NaiveDate,
    year_end: NaiveDate,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(days), 0)::DOUBLE PRECISION FROM leave_requests \
         WHERE user_id = $1 AND leave_type_id = $2 AND status = 'pending' \
         AND start_date BETWEEN $3 AND $4",
    )
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year_start)
    .bind(year_end)
    .fetch_one(db)
    .await
}

/// Adds `delta` days (negative to restore) to `used_days`.
pub async fn add_used_days(
    db: impl PgExecutor<'_>,
    id: LeaveBalanceId,
    delta: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE leave_balances SET used_days = GREATEST(used_days + $2, 0), updated_at = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn adjust_balance(
    db: impl PgExecutor<'_>,
    id: LeaveBalanceId,
    allocated_days: f64,
    carried_over_days: f64,
) -> Result<LeaveBalance, sqlx::Error> {
    sqlx::query_as::<_, LeaveBalance>(&format!(
        "UPDATE leave_balances SET allocated_days = $2, carried_over_days = $3, updated_at = $4 \
         WHERE id = $1 RETURNING {BALANCE_COLUMNS}"
    ))
    .bind(id)
    .bind(allocated_days)
    .bind(carried_over_days)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}
