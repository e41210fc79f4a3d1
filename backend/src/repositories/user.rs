//! Repository functions for organization members.

use chrono::{NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::{
    models::user::{User, UserListQuery, UserRole, UserStatus},
    repositories::common::push_clause,
    types::{OrganizationId, TeamId, UserId},
};

pub const USER_COLUMNS: &str = "id, organization_id, email, password_hash, full_name, role, status, \
     team_id, removal_effective_at, archived_at, created_at, updated_at";

pub async fn insert_user(db: impl PgExecutor<'_>, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, organization_id, email, password_hash, full_name, role, status, \
         team_id, removal_effective_at, archived_at, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(user.id)
    .bind(user.organization_id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(user.role)
    .bind(user.status)
    .bind(user.team_id)
    .bind(user.removal_effective_at)
    .bind(user.archived_at)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn find_by_id(db: impl PgExecutor<'_>, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// Finds a member of `organization_id`; users of other tenants are invisible.
pub async fn find_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND organization_id = $2"
    ))
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

/// Same as [`find_in_org`] but takes a row lock for status transitions.
pub async fn lock_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    user_id: UserId,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND organization_id = $2 FOR UPDATE"
    ))
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_email(db: impl PgExecutor<'_>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn list_users(
    pool: &PgPool,
    organization_id: OrganizationId,
    filters: &UserListQuery,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder: QueryBuilder<'_, Postgres> =
        QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
    let mut has_clause = false;
    push_clause(&mut builder, &mut has_clause);
    builder.push("organization_id = ").push_bind(organization_id);
    if let Some(status) = filters.status {
        push_clause(&mut builder, &mut has_clause);
        builder.push("status = ").push_bind(status);
    }
    if let Some(team_id) = filters.team_id {
        push_clause(&mut builder, &mut has_clause);
        builder.push("team_id = ").push_bind(team_id);
    }
    builder.push(" ORDER BY full_name ASC, created_at ASC");
    builder.build_query_as::<User>().fetch_all(pool).await
}

pub async fn update_profile(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    full_name: &str,
    role: UserRole,
    team_id: Option<TeamId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET full_name = $2, role = $3, team_id = $4, updated_at = $5 WHERE id = $1",
    )
    .bind(user_id)
    .bind(full_name)
    .bind(role)
    .bind(team_id)
    .bind(Utc::now())
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn mark_pending_removal(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    effective_date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET status = 'pending_removal', removal_effective_at = $2, updated_at = $3 \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(effective_date)
    .bind(Utc::now())
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn mark_active(db: impl PgExecutor<'_>, user_id: UserId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET status = 'active', removal_effective_at = NULL, archived_at = NULL, \
         updated_at = $2 WHERE id = $1",
    )
    .bind(user_id)
    .bind(Utc::now())
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn mark_archived(db: impl PgExecutor<'_>, user_id: UserId) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE users SET status = 'archived', removal_effective_at = NULL, archived_at = $2, \
         updated_at = $2 WHERE id = $1",
    )
    .bind(user_id)
    .bind(now)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn update_password(
    db: impl PgExecutor<'_>,
    user_id: UserId,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(db)
        .await
        .map(|_| ())
}

/// Counts active admins, optionally ignoring one user. Admins pending removal
/// are about to lose access and do not count.
pub async fn count_active_admins(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    excluding: Option<UserId>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND role = 'admin' \
         AND status = 'active' AND ($2::TEXT IS NULL OR id <> $2)",
    )
    .bind(organization_id)
    .bind(excluding)
    .fetch_one(db)
    .await
}

/// Users whose pending removal has come due.
pub async fn find_due_removals(
    db: impl PgExecutor<'_>,
    today: NaiveDate,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE status = $1 AND removal_effective_at <= $2 \
         ORDER BY removal_effective_at ASC FOR UPDATE SKIP LOCKED"
    ))
    .bind(UserStatus::PendingRemoval)
    .bind(today)
    .fetch_all(db)
    .await
}

pub async fn email_in_use(db: impl PgExecutor<'_>, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(db)
        .await
}
