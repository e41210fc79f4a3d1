//! Tenant signup.

use chrono::Utc;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        leave_type::{LeaveType, DEFAULT_LEAVE_TYPES},
        organization::{slugify, Organization, RegisterOrganization},
        user::{normalize_email, User, UserRole},
        work_schedule::WorkWeek,
    },
    repositories::{self, leave_balance, leave_type, organization, schedule, user as user_repo},
    types::{LeaveTypeId, OrganizationId},
    utils::{
        password::hash_password,
        time::{leave_year_for, today_local},
    },
};

pub const DEFAULT_ANNUAL_ALLOWANCE: f64 = 20.0;
const MAX_SLUG_ATTEMPTS: u32 = 20;

/// Picks `base`, then `base-2`, `base-3`, ... until one is free.
async fn unique_slug(pool: &PgPool, name: &str) -> AppResult<String> {
    let base = slugify(name);
    if !organization::slug_exists(pool, &base).await? {
        return Ok(base);
    }
    for suffix in 2..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, suffix);
        if !organization::slug_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    let random = uuid::Uuid::new_v4().simple().to_string();
    Ok(format!("{}-{}", base, &random[..8]))
}

/// Creates the organization, its first admin, the default work week, the
/// default leave types and the admin's balances.
pub async fn register_organization(
    pool: &PgPool,
    config: &Config,
    payload: RegisterOrganization,
) -> AppResult<(Organization, User)> {
    let email = normalize_email(&payload.email);
    if user_repo::email_in_use(pool, &email).await? {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let now = Utc::now();
    let organization = Organization {
        id: OrganizationId::new(),
        name: payload.organization_name.trim().to_string(),
        slug: unique_slug(pool, &payload.organization_name).await?,
        country_code: payload.country_code,
        leave_year_start_month: 1,
        default_annual_allowance: DEFAULT_ANNUAL_ALLOWANCE,
        created_at: now,
        updated_at: now,
    };
    let admin = User::new(
        organization.id,
        &email,
        hash_password(&payload.password)?,
        payload.full_name.trim().to_string(),
        UserRole::Admin,
    );

    let mut tx = repositories::begin_transaction(pool).await?;
    organization::insert_organization(&mut *tx, &organization).await?;
    user_repo::insert_user(&mut *tx, &admin).await?;
    schedule::upsert_schedule(&mut *tx, organization.id, None, &WorkWeek::default()).await?;
    for (name, color, deducts_balance, requires_approval) in DEFAULT_LEAVE_TYPES {
        let leave_type = LeaveType {
            id: LeaveTypeId::new(),
            organization_id: organization.id,
            name: (*name).to_string(),
            color: (*color).to_string(),
            deducts_balance: *deducts_balance,
            requires_approval: *requires_approval,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        leave_type::insert_leave_type(&mut *tx, &leave_type).await?;
    }
    let year = leave_year_for(today_local(&config.time_zone), organization.start_month());
    leave_balance::ensure_balances_for_user(
        &mut *tx,
        organization.id,
        admin.id,
        year,
        organization.default_annual_allowance,
    )
    .await?;
    repositories::commit_transaction(tx).await?;

    tracing::info!(
        organization_id = %organization.id,
        slug = %organization.slug,
        admin_id = %admin.id,
        "Organization registered"
    );
    Ok((organization, admin))
}
