//! Invitations reserve a seat from creation until they are accepted,
//! revoked or expire.

use chrono::{Duration, Utc};
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::{
        invitation::{AcceptInvitation, CreateInvitation, Invitation, InvitationStatus},
        user::{normalize_email, User, UserRole},
    },
    repositories::{self, invitation as invitation_repo, leave_balance, organization, team, user as user_repo},
    seats,
    services::billing,
    state::AppState,
    types::{InvitationId, OrganizationId},
    utils::{
        email::InvitationEmail,
        password::hash_password,
        time::{leave_year_for, today_local},
        tokens::{generate_token, hash_token},
    },
};

async fn ensure_email_available(
    conn: &mut PgConnection,
    organization_id: OrganizationId,
    email: &str,
) -> AppResult<()> {
    if let Some(existing) = user_repo::find_by_email(&mut *conn, email).await? {
        let message = if existing.organization_id == organization_id {
            if existing.can_sign_in() {
                "A member with this email already exists"
            } else {
                "This email belongs to an archived member; reactivate them instead"
            }
        } else {
            "Email is already registered"
        };
        return Err(AppError::Conflict(message.into()));
    }
    if invitation_repo::open_invitation_exists(&mut *conn, organization_id, email, Utc::now()).await?
    {
        return Err(AppError::Conflict(
            "An open invitation for this email already exists".into(),
        ));
    }
    Ok(())
}

async fn send_invitation_email(state: &AppState, inviter: &User, invitation: &Invitation, token: &str) {
    let organization_name = match organization::find_by_id(&state.pool, invitation.organization_id).await {
        Ok(Some(org)) => org.name,
        _ => String::from("your organization"),
    };
    let email = InvitationEmail {
        to: &invitation.email,
        organization_name: &organization_name,
        inviter_name: &inviter.full_name,
        token,
        expires_in_days: state.config.invitation_expiry_days,
    };
    if let Err(err) = state.email.send_invitation(email).await {
        tracing::warn!(
            invitation_id = %invitation.id,
            error = %err,
            "Failed to send invitation email"
        );
    }
}

pub async fn create_invitation(
    state: &AppState,
    inviter: &User,
    payload: CreateInvitation,
) -> AppResult<Invitation> {
    if payload.role != UserRole::Employee && !inviter.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can invite managers or admins".into(),
        ));
    }
    let email = normalize_email(&payload.email);

    let mut tx = repositories::begin_transaction(&state.pool).await?;
    billing::reserve_seats(&mut *tx, state.seat_policy(), inviter.organization_id, 1).await?;
    ensure_email_available(&mut *tx, inviter.organization_id, &email).await?;
    if let Some(team_id) = payload.team_id {
        team::find_in_org(&mut *tx, inviter.organization_id, team_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown team".into()))?;
    }

    let token = generate_token();
    let now = Utc::now();
    let invitation = Invitation {
        id: InvitationId::new(),
        organization_id: inviter.organization_id,
        email,
        role: payload.role,
        team_id: payload.team_id,
        token_hash: hash_token(&token),
        status: InvitationStatus::Pending,
        invited_by: Some(inviter.id),
        expires_at: now + Duration::days(state.config.invitation_expiry_days),
        accepted_at: None,
        created_at: now,
    };
    invitation_repo::insert_invitation(&mut *tx, &invitation).await?;
    repositories::commit_transaction(tx).await?;

    tracing::info!(
        invitation_id = %invitation.id,
        organization_id = %invitation.organization_id,
        role = invitation.role.as_str(),
        "Invitation created"
    );
    send_invitation_email(state, inviter, &invitation, &token).await;
    Ok(invitation)
}

pub async fn revoke_invitation(state: &AppState, actor: &User, id: InvitationId) -> AppResult<()> {
    let mut tx = repositories::begin_transaction(&state.pool).await?;
    let invitation = invitation_repo::find_in_org(&mut *tx, actor.organization_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::Conflict("Invitation is no longer pending".into()));
    }
    invitation_repo::mark_revoked(&mut *tx, id).await?;
    repositories::commit_transaction(tx).await?;
    tracing::info!(invitation_id = %id, "Invitation revoked");
    Ok(())
}

/// Issues a new token and expiry. An invitation that had already expired no
/// longer held a seat, so reviving it needs a free one.
pub async fn resend_invitation(
    state: &AppState,
    actor: &User,
    id: InvitationId,
) -> AppResult<Invitation> {
    let mut tx = repositories::begin_transaction(&state.pool).await?;
    organization::lock_for_seat_change(&mut *tx, actor.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    let invitation = invitation_repo::find_in_org(&mut *tx, actor.organization_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))?;
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::Conflict("Invitation is no longer pending".into()));
    }
    let now = Utc::now();
    if !invitation.is_open(now) {
        let snapshot =
            billing::seat_snapshot(&mut *tx, state.seat_policy(), actor.organization_id, now).await?;
        seats::ensure_capacity(&snapshot.summary, 1)?;
    }

    let token = generate_token();
    let refreshed = invitation_repo::refresh_token(
        &mut *tx,
        id,
        &hash_token(&token),
        now + Duration::days(state.config.invitation_expiry_days),
    )
    .await?;
    repositories::commit_transaction(tx).await?;

    tracing::info!(invitation_id = %id, "Invitation resent");
    send_invitation_email(state, actor, &refreshed, &token).await;
    Ok(refreshed)
}

/// Turns an open invitation into an active member. Seat usage is unchanged:
/// the invitation already held the seat the new member takes over.
pub async fn accept_invitation(state: &AppState, payload: AcceptInvitation) -> AppResult<User> {
    let token_hash = hash_token(&payload.token);
    let mut tx = repositories::begin_transaction(&state.pool).await?;
    let invitation = invitation_repo::find_by_token_hash(&mut *tx, &token_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))?;
    let now = Utc::now();
    if !invitation.is_open(now) {
        return Err(AppError::BadRequest(
            "Invitation has expired or is no longer valid".into(),
        ));
    }
    if user_repo::email_in_use(&mut *tx, &invitation.email).await? {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let mut user = User::new(
        invitation.organization_id,
        &invitation.email,
        hash_password(&payload.password)?,
        payload.full_name.trim().to_string(),
        invitation.role,
    );
    user.team_id = invitation.team_id;
    user_repo::insert_user(&mut *tx, &user).await?;
    invitation_repo::mark_accepted(&mut *tx, invitation.id, now).await?;

    let org = organization::find_by_id(&mut *tx, invitation.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    let year = leave_year_for(today_local(&state.config.time_zone), org.start_month());
    leave_balance::ensure_balances_for_user(
        &mut *tx,
        org.id,
        user.id,
        year,
        org.default_annual_allowance,
    )
    .await?;
    repositories::commit_transaction(tx).await?;

    tracing::info!(
        invitation_id = %invitation.id,
        user_id = %user.id,
        organization_id = %org.id,
        "Invitation accepted"
    );
    Ok(user)
}
