use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        team::{Team, TeamPayload, TeamWithMembers},
        user::User,
    },
    repositories::{team, user as user_repo},
    state::AppState,
    types::{OrganizationId, TeamId, UserId},
};

/// A team manager must be a manager or admin of the same organization who can
/// still sign in.
async fn ensure_valid_manager(
    state: &AppState,
    organization_id: OrganizationId,
    manager_id: Option<UserId>,
) -> AppResult<()> {
    let Some(manager_id) = manager_id else {
        return Ok(());
    };
    let manager = user_repo::find_in_org(&state.pool, organization_id, manager_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Team manager must belong to the organization".into()))?;
    if !manager.is_manager_or_admin() || !manager.can_sign_in() {
        return Err(AppError::BadRequest(
            "Team manager must be an active manager or admin".into(),
        ));
    }
    Ok(())
}

pub async fn list_teams(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<TeamWithMembers>>> {
    Ok(Json(team::list_teams(&state.pool, user.organization_id).await?))
}

pub async fn create_team(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(payload): Json<TeamPayload>,
) -> AppResult<(StatusCode, Json<Team>)> {
    payload.validate()?;
    ensure_valid_manager(&state, admin.organization_id, payload.manager_id).await?;
    let now = Utc::now();
    let created = Team {
        id: TeamId::new(),
        organization_id: admin.organization_id,
        name: payload.name.trim().to_string(),
        manager_id: payload.manager_id,
        created_at: now,
        updated_at: now,
    };
    team::insert_team(&state.pool, &created).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(team_id): Path<TeamId>,
    Json(payload): Json<TeamPayload>,
) -> AppResult<Json<Team>> {
    payload.validate()?;
    team::find_in_org(&state.pool, admin.organization_id, team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))?;
    ensure_valid_manager(&state, admin.organization_id, payload.manager_id).await?;
    let updated =
        team::update_team(&state.pool, team_id, payload.name.trim(), payload.manager_id).await?;
    Ok(Json(updated))
}

pub async fn delete_team(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(team_id): Path<TeamId>,
) -> AppResult<StatusCode> {
    let deleted = team::delete_team(&state.pool, admin.organization_id, team_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Team not found".into()));
    }
    tracing::info!(team_id = %team_id, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}
