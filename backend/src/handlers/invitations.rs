use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        invitation::{AcceptInvitation, CreateInvitation, InvitationResponse},
        user::{User, UserResponse},
    },
    repositories::invitation as invitation_repo,
    services::invitations,
    state::AppState,
    types::InvitationId,
};

pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<InvitationResponse>>> {
    let open = invitation_repo::list_open(&state.pool, user.organization_id, Utc::now()).await?;
    Ok(Json(open.into_iter().map(InvitationResponse::from).collect()))
}

pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateInvitation>,
) -> AppResult<(StatusCode, Json<InvitationResponse>)> {
    payload.validate()?;
    let invitation = invitations::create_invitation(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(invitation.into())))
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<InvitationId>,
) -> AppResult<StatusCode> {
    invitations::revoke_invitation(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resend_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<InvitationId>,
) -> AppResult<Json<InvitationResponse>> {
    let invitation = invitations::resend_invitation(&state, &user, id).await?;
    Ok(Json(invitation.into()))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Json(payload): Json<AcceptInvitation>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    payload.validate()?;
    let user = invitations::accept_invitation(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
