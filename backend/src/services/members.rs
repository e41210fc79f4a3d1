//! Member lifecycle: scheduled removal, archival and reactivation.
//!
//! Users pending removal keep access and keep their seat until their
//! effective date. Archived users hold no seat; bringing one back needs a
//! free seat.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::{PgConnection, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserRole, UserStatus},
    repositories::{self, auth, organization, subscription, team, user as user_repo},
    seats::SeatPolicy,
    services::billing,
    types::UserId,
};

/// Locks the actor's organization, then the target user. Membership changes
/// always take the locks in this order.
pub async fn lock_target(
    conn: &mut PgConnection,
    actor: &User,
    target_id: UserId,
) -> AppResult<User> {
    organization::lock_for_seat_change(&mut *conn, actor.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    user_repo::lock_in_org(conn, actor.organization_id, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Fails unless an active admin other than `leaving` remains. Callers must
/// hold the organization lock from [`lock_target`].
pub async fn ensure_admin_remains(conn: &mut PgConnection, leaving: &User) -> AppResult<()> {
    let remaining =
        user_repo::count_active_admins(conn, leaving.organization_id, Some(leaving.id)).await?;
    if remaining == 0 {
        return Err(AppError::Conflict(
            "The organization must keep at least one admin".into(),
        ));
    }
    Ok(())
}

/// Refuses to remove the acting admin or the last active admin.
async fn guard_removal(conn: &mut PgConnection, actor: &User, target: &User) -> AppResult<()> {
    if actor.id == target.id {
        return Err(AppError::BadRequest("You cannot remove yourself".into()));
    }
    if target.role == UserRole::Admin {
        ensure_admin_remains(conn, target).await?;
    }
    Ok(())
}

async fn archive_locked(conn: &mut PgConnection, target: &User) -> AppResult<()> {
    user_repo::mark_archived(&mut *conn, target.id).await?;
    let revoked = auth::delete_refresh_tokens_for_user(&mut *conn, target.id).await?;
    let unmanaged_teams = team::clear_manager(&mut *conn, target.id).await?;
    tracing::info!(
        user_id = %target.id,
        organization_id = %target.organization_id,
        revoked_sessions = revoked,
        unmanaged_teams,
        "User archived"
    );
    Ok(())
}

/// Default removal date: the day the current paid period renews, or `today`
/// without a subscription.
pub async fn default_removal_date(
    pool: &PgPool,
    actor: &User,
    tz: &Tz,
    today: NaiveDate,
) -> AppResult<NaiveDate> {
    let renewal = subscription::find_by_organization(pool, actor.organization_id)
        .await?
        .filter(|sub| sub.paid_seats(Utc::now()) > 0)
        .and_then(|sub| sub.renews_at)
        .map(|at| at.with_timezone(tz).date_naive());
    Ok(match renewal {
        Some(date) if date > today => date,
        _ => today,
    })
}

/// Marks an active user for removal on `effective_date`. A removal effective
/// today archives the user immediately.
pub async fn schedule_removal(
    pool: &PgPool,
    actor: &User,
    target_id: UserId,
    effective_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<User> {
    if effective_date < today {
        return Err(AppError::BadRequest(
            "Removal date must be today or later".into(),
        ));
    }
    let mut tx = repositories::begin_transaction(pool).await?;
    let target = lock_target(&mut *tx, actor, target_id).await?;
    if target.status != UserStatus::Active {
        return Err(AppError::Conflict(format!(
            "User is {}, only active users can be scheduled for removal",
            target.status.as_str()
        )));
    }
    guard_removal(&mut *tx, actor, &target).await?;

    if effective_date == today {
        archive_locked(&mut *tx, &target).await?;
    } else {
        user_repo::mark_pending_removal(&mut *tx, target.id, effective_date).await?;
        tracing::info!(
            user_id = %target.id,
            organization_id = %target.organization_id,
            effective_date = %effective_date,
            "User scheduled for removal"
        );
    }
    let updated = user_repo::find_by_id(&mut *tx, target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    repositories::commit_transaction(tx).await?;
    Ok(updated)
}

/// Takes a user back from pending removal. The seat was never released, so
/// no capacity check is needed.
pub async fn cancel_removal(pool: &PgPool, actor: &User, target_id: UserId) -> AppResult<User> {
    let mut tx = repositories::begin_transaction(pool).await?;
    let target = lock_target(&mut *tx, actor, target_id).await?;
    if target.status != UserStatus::PendingRemoval {
        return Err(AppError::Conflict("User is not pending removal".into()));
    }
    user_repo::mark_active(&mut *tx, target.id).await?;
    let updated = user_repo::find_by_id(&mut *tx, target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    repositories::commit_transaction(tx).await?;
    tracing::info!(user_id = %target.id, "Pending removal cancelled");
    Ok(updated)
}

pub async fn archive(pool: &PgPool, actor: &User, target_id: UserId) -> AppResult<User> {
    let mut tx = repositories::begin_transaction(pool).await?;
    let target = lock_target(&mut *tx, actor, target_id).await?;
    if target.status == UserStatus::Archived {
        return Err(AppError::Conflict("User is already archived".into()));
    }
    guard_removal(&mut *tx, actor, &target).await?;
    archive_locked(&mut *tx, &target).await?;
    let updated = user_repo::find_by_id(&mut *tx, target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    repositories::commit_transaction(tx).await?;
    Ok(updated)
}

/// Brings an archived user back. Needs one free seat.
pub async fn reactivate(
    pool: &PgPool,
    policy: SeatPolicy,
    actor: &User,
    target_id: UserId,
) -> AppResult<User> {
    let mut tx = repositories::begin_transaction(pool).await?;
    billing::reserve_seats(&mut *tx, policy, actor.organization_id, 1).await?;
    let target = lock_target(&mut *tx, actor, target_id).await?;
    if target.status != UserStatus::Archived {
        return Err(AppError::Conflict("Only archived users can be reactivated".into()));
    }
    user_repo::mark_active(&mut *tx, target.id).await?;
    let updated = user_repo::find_by_id(&mut *tx, target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    repositories::commit_transaction(tx).await?;
    tracing::info!(user_id = %target.id, "User reactivated");
    Ok(updated)
}

/// Archives every user whose pending removal is due on or before `today`.
/// Returns how many users were archived.
pub async fn apply_due_removals(pool: &PgPool, today: NaiveDate) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let due = user_repo::find_due_removals(&mut *tx, today).await?;
    for target in &due {
        user_repo::mark_archived(&mut *tx, target.id).await?;
        auth::delete_refresh_tokens_for_user(&mut *tx, target.id).await?;
        team::clear_manager(&mut *tx, target.id).await?;
        tracing::info!(
            user_id = %target.id,
            organization_id = %target.organization_id,
            effective_date = ?target.removal_effective_at,
            "Pending removal applied"
        );
    }
    tx.commit().await?;
    Ok(due.len() as u64)
}
