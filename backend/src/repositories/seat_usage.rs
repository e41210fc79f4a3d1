//! Loads seat occupancy counts for an organization.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};

use crate::{seats::SeatUsage, types::OrganizationId};

#[derive(Debug, FromRow)]
struct SeatUsageRow {
    active_users: i64,
    pending_removal_users: i64,
    pending_invitations: i64,
}

impl From<SeatUsageRow> for SeatUsage {
    fn from(row: SeatUsageRow) -> Self {
        let clamp = |value: i64| u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        SeatUsage {
            active_users: clamp(row.active_users),
            pending_removal_users: clamp(row.pending_removal_users),
            pending_invitations: clamp(row.pending_invitations),
        }
    }
}

/// Archived users and expired or revoked invitations are not counted.
pub async fn load_seat_usage(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    now: DateTime<Utc>,
) -> Result<SeatUsage, sqlx::Error> {
    sqlx::query_as::<_, SeatUsageRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users
              WHERE organization_id = $1 AND status = 'active') AS active_users,
            (SELECT COUNT(*) FROM users
              WHERE organization_id = $1 AND status = 'pending_removal') AS pending_removal_users,
            (SELECT COUNT(*) FROM invitations
              WHERE organization_id = $1 AND status = 'pending' AND expires_at > $2) AS pending_invitations
        "#,
    )
    .bind(organization_id)
    .bind(now)
    .fetch_one(db)
    .await
    .map(SeatUsage::from)
}
