//! Repository functions for tenants.

use chrono::Utc;
use sqlx::{PgConnection, PgExecutor};

use crate::{models::organization::Organization, types::OrganizationId};

const ORGANIZATION_COLUMNS: &str = "id, name, slug, country_code, leave_year_start_month, \
     default_annual_allowance, created_at, updated_at";

pub async fn insert_organization(
    db: impl PgExecutor<'_>,
    organization: &Organization,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO organizations (id, name, slug, country_code, leave_year_start_month, \
         default_annual_allowance, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(organization.id)
    .bind(&organization.name)
    .bind(&organization.slug)
    .bind(&organization.country_code)
    .bind(organization.leave_year_start_month)
    .bind(organization.default_annual_allowance)
    .bind(organization.created_at)
    .bind(organization.updated_at)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn find_by_id(
    db: impl PgExecutor<'_>,
    id: OrganizationId,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Locks the organization row. Every seat-consuming change takes this lock
/// first so concurrent invites cannot both see the last free seat.
pub async fn lock_for_seat_change(
    conn: &mut PgConnection,
    id: OrganizationId,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn slug_exists(db: impl PgExecutor<'_>, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM organizations WHERE slug = $1)")
        .bind(slug)
        .fetch_one(db)
        .await
}

pub async fn update_organization(
    db: impl PgExecutor<'_>,
    organization: &Organization,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(&format!(
        "UPDATE organizations SET name = $2, country_code = $3, leave_year_start_month = $4, \
         default_annual_allowance = $5, updated_at = $6 WHERE id = $1 \
         RETURNING {ORGANIZATION_COLUMNS}"
    ))
    .bind(organization.id)
    .bind(&organization.name)
    .bind(&organization.country_code)
    .bind(organization.leave_year_start_month)
    .bind(organization.default_annual_allowance)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}
