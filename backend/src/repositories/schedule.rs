use chrono::Utc;
use sqlx::PgExecutor;

use crate::{
    models::work_schedule::{WorkSchedule, WorkWeek},
    types::{OrganizationId, UserId, WorkScheduleId},
};

const SCHEDULE_COLUMNS: &str = "id, organization_id, user_id, monday, tuesday, wednesday, thursday, \
     friday, saturday, sunday, created_at, updated_at";

pub async fn find_org_default(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM work_schedules \
         WHERE organization_id = $1 AND user_id IS NULL"
    ))
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn find_for_user(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM work_schedules \
         WHERE organization_id = $1 AND user_id = $2"
    ))
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Returns the user's override, else the organization default, in one round trip.
pub async fn find_effective(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM work_schedules \
         WHERE organization_id = $1 AND (user_id = $2 OR user_id IS NULL) \
         ORDER BY user_id NULLS LAST LIMIT 1"
    ))
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Inserts or replaces the schedule for `user_id` (or the default when `None`).
pub async fn upsert_schedule(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: Option<UserId>,
    week: &WorkWeek,
) -> Result<WorkSchedule, sqlx::Error> {
    let conflict_target = if user_id.is_some() {
        "(user_id) WHERE user_id IS NOT NULL"
    } else {
        "(organization_id) WHERE user_id IS NULL"
    };
    let now = Utc::now();
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "INSERT INTO work_schedules (id, organization_id, user_id, monday, tuesday, wednesday, \
         thursday, friday, saturday, sunday, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) \
         ON CONFLICT {conflict_target} DO UPDATE SET \
         monday = EXCLUDED.monday, tuesday = EXCLUDED.tuesday, wednesday = EXCLUDED.wednesday, \
         thursday = EXCLUDED.thursday, friday = EXCLUDED.friday, saturday = EXCLUDED.saturday, \
         sunday = EXCLUDED.sunday, updated_at = EXCLUDED.updated_at \
         RETURNING {SCHEDULE_COLUMNS}"
    ))
    .bind(WorkScheduleId::new())
    .bind(organization_id)
    .bind(user_id)
    .bind(week.monday)
    .bind(week.tuesday)
    .bind(week.wednesday)
    .bind(week.thursday)
    .bind(week.friday)
    .bind(week.saturday)
    .bind(week.sunday)
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn delete_user_schedule(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM work_schedules WHERE organization_id = $1 AND user_id = $2")
        .bind(organization_id)
        .bind(user_id)
        .execute(db)
        .await
        .map(|result| result.rows_affected())
}
