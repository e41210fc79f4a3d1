use chrono::Utc;
use sqlx::PgExecutor;

use crate::{
    models::team::{Team, TeamWithMembers},
    types::{OrganizationId, TeamId, UserId},
};

const TEAM_COLUMNS: &str = "id, organization_id, name, manager_id, created_at, updated_at";

pub async fn list_teams(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
) -> Result<Vec<TeamWithMembers>, sqlx::Error> {
    sqlx::query_as::<_, TeamWithMembers>(
        "SELECT t.id, t.name, t.manager_id, \
         (SELECT COUNT(*) FROM users u WHERE u.team_id = t.id AND u.status <> 'archived') AS member_count \
         FROM teams t WHERE t.organization_id = $1 ORDER BY t.name",
    )
    .bind(organization_id)
    .fetch_all(db)
    .await
}

pub async fn find_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    id: TeamId,
) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 AND organization_id = $2"
    ))
    .bind(id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_team(db: impl PgExecutor<'_>, team: &Team) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO teams (id, organization_id, name, manager_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(team.id)
    .bind(team.organization_id)
    .bind(&team.name)
    .bind(team.manager_id)
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn update_team(
    db: impl PgExecutor<'_>,
    id: TeamId,
    name: &str,
    manager_id: Option<UserId>,
) -> Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(&format!(
        "UPDATE teams SET name = $2, manager_id = $3, updated_at = $4 WHERE id = $1 \
         RETURNING {TEAM_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(manager_id)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

/// Deletes a team. Members keep their accounts; `team_id` is cleared by the
/// foreign key.
pub async fn delete_team(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    id: TeamId,
) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM teams WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(organization_id)
        .execute(db)
        .await
        .map(|result| result.rows_affected())
}

/// Detaches `manager_id` from every team they manage.
pub async fn clear_manager(db: impl PgExecutor<'_>, manager_id: UserId) -> Result<u64, sqlx::Error> {
    sqlx::query("UPDATE teams SET manager_id = NULL, updated_at = $2 WHERE manager_id = $1")
        .bind(manager_id)
        .bind(Utc::now())
        .execute(db)
        .await
        .map(|result| result.rows_affected())
}

/// Whether `manager_id` manages the team `member_id` belongs to.
pub async fn manages_member(
    db: impl PgExecutor<'_>,
    manager_id: UserId,
    member_id: UserId,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users u JOIN teams t ON t.id = u.team_id \
         WHERE u.id = $2 AND t.manager_id = $1)",
    )
    .bind(manager_id)
    .bind(member_id)
    .fetch_one(db)
    .await
}
