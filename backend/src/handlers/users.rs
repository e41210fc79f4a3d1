use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        leave_balance::LeaveBalanceResponse,
        user::{ScheduleRemovalRequest, UpdateUser, User, UserListQuery, UserResponse, UserRole},
    },
    repositories::{self, team, user as user_repo},
    services::{leave, members},
    state::AppState,
    types::UserId,
    utils::time::today_local,
};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(filters): Query<UserListQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user_repo::list_users(&state.pool, user.organization_id, &filters).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserResponse>> {
    let found = user_repo::find_in_org(&state.pool, user.organization_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(found.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    payload.validate()?;
    let mut tx = repositories::begin_transaction(&state.pool).await?;
    let target = members::lock_target(&mut *tx, &admin, user_id).await?;

    let full_name = match payload.full_name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::BadRequest("Full name cannot be blank".into())),
        Some(name) => name.to_string(),
        None => target.full_name.clone(),
    };
    let role = payload.role.unwrap_or(target.role);
    if target.role == UserRole::Admin && role != UserRole::Admin {
        members::ensure_admin_remains(&mut *tx, &target).await?;
    }
    if role == UserRole::Employee && target.role != UserRole::Employee {
        let unmanaged = team::clear_manager(&mut *tx, target.id).await?;
        if unmanaged > 0 {
            tracing::info!(
                user_id = %target.id,
                teams = unmanaged,
                "Demoted user removed as team manager"
            );
        }
    }
    let team_id = match payload.team_id {
        Some(Some(team_id)) => {
            team::find_in_org(&mut *tx, admin.organization_id, team_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Unknown team".into()))?;
            Some(team_id)
        }
        Some(None) => None,
        None => target.team_id,
    };

    user_repo::update_profile(&mut *tx, target.id, &full_name, role, team_id).await?;
    let updated = user_repo::find_by_id(&mut *tx, target.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    repositories::commit_transaction(tx).await?;
    Ok(Json(updated.into()))
}

pub async fn schedule_removal(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<ScheduleRemovalRequest>,
) -> AppResult<Json<UserResponse>> {
    let today = today_local(&state.config.time_zone);
    let effective_date = match payload.effective_date {
        Some(date) => date,
        None => {
            members::default_removal_date(&state.pool, &admin, &state.config.time_zone, today)
                .await?
        }
    };
    let updated =
        members::schedule_removal(&state.pool, &admin, user_id, effective_date, today).await?;
    Ok(Json(updated.into()))
}

pub async fn cancel_removal(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserResponse>> {
    let updated = members::cancel_removal(&state.pool, &admin, user_id).await?;
    Ok(Json(updated.into()))
}

pub async fn archive_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserResponse>> {
    let updated = members::archive(&state.pool, &admin, user_id).await?;
    Ok(Json(updated.into()))
}

pub async fn reactivate_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserResponse>> {
    let updated = members::reactivate(&state.pool, state.seat_policy(), &admin, user_id).await?;
    Ok(Json(updated.into()))
}

/// Balances of another member. Managers only see members of teams they lead.
pub async fn user_leave_balances(
    State(state): State<AppState>,
    Extension(viewer): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<Vec<LeaveBalanceResponse>>> {
    let target = user_repo::find_in_org(&state.pool, viewer.organization_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !viewer.is_admin()
        && viewer.id != target.id
        && !team::manages_member(&state.pool, viewer.id, target.id).await?
    {
        return Err(AppError::Forbidden(
            "Managers can only view balances of their team members".into(),
        ));
    }
    let org = leave::load_organization(&state.pool, viewer.organization_id).await?;
    let today = today_local(&state.config.time_zone);
    Ok(Json(
        leave::balances_for_user(&state.pool, &org, target.id, today).await?,
    ))
}
