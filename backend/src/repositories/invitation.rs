//! Repository functions for member invitations.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::{
    models::invitation::Invitation,
    types::{InvitationId, OrganizationId},
};

const INVITATION_COLUMNS: &str = "id, organization_id, email, role, team_id, token_hash, status, \
     invited_by, expires_at, accepted_at, created_at";

pub async fn insert_invitation(
    db: impl PgExecutor<'_>,
    invitation: &Invitation,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO invitations (id, organization_id, email, role, team_id, token_hash, status, \
         invited_by, expires_at, accepted_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(invitation.id)
    .bind(invitation.organization_id)
    .bind(&invitation.email)
    .bind(invitation.role)
    .bind(invitation.team_id)
    .bind(&invitation.token_hash)
    .bind(invitation.status)
    .bind(invitation.invited_by)
    .bind(invitation.expires_at)
    .bind(invitation.accepted_at)
    .bind(invitation.created_at)
    .execute(db)
    .await
    .map(|_| ())
}

pub async fn list_open(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    now: DateTime<Utc>,
) -> Result<Vec<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations \
         WHERE organization_id = $1 AND status = 'pending' AND expires_at > $2 \
         ORDER BY created_at DESC"
    ))
    .bind(organization_id)
    .bind(now)
    .fetch_all(db)
    .await
}

pub async fn find_in_org(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    id: InvitationId,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1 AND organization_id = $2 \
         FOR UPDATE"
    ))
    .bind(id)
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_token_hash(
    db: impl PgExecutor<'_>,
    token_hash: &str,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE token_hash = $1 FOR UPDATE"
    ))
    .bind(token_hash)
    .fetch_optional(db)
    .await
}

pub async fn open_invitation_exists(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    email: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM invitations WHERE organization_id = $1 AND email = $2 \
         AND status = 'pending' AND expires_at > $3)",
    )
    .bind(organization_id)
    .bind(email)
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn mark_revoked(db: impl PgExecutor<'_>, id: InvitationId) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE invitations SET status = 'revoked' WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .map(|_| ())
}

pub async fn mark_accepted(
    db: impl PgExecutor<'_>,
    id: InvitationId,
    accepted_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE invitations SET status = 'accepted', accepted_at = $2 WHERE id = $1")
        .bind(id)
        .bind(accepted_at)
        .execute(db)
        .await
        .map(|_| ())
}

/// Replaces the token and pushes the expiry out.
pub async fn refresh_token(
    db: impl PgExecutor<'_>,
    id: InvitationId,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<Invitation, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "UPDATE invitations SET token_hash = $2, expires_at = $3 WHERE id = $1 \
         RETURNING {INVITATION_COLUMNS}"
    ))
    .bind(id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(db)
    .await
}

/// Revokes invitations that expired while still pending.
pub async fn revoke_expired(db: impl PgExecutor<'_>, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    sqlx::query("UPDATE invitations SET status = 'revoked' WHERE status = 'pending' AND expires_at <= $1")
        .bind(now)
        .execute(db)
        .await
        .map(|result| result.rows_affected())
}
