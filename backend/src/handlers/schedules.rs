use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::User,
        work_schedule::{ScheduleResponse, ScheduleSource, WorkWeek},
    },
    repositories::{schedule, user as user_repo},
    state::AppState,
    types::{OrganizationId, UserId},
};

async fn resolve_schedule(
    pool: &PgPool,
    organization_id: OrganizationId,
    user_id: UserId,
) -> AppResult<ScheduleResponse> {
    if let Some(own) = schedule::find_for_user(pool, organization_id, user_id).await? {
        return Ok(ScheduleResponse {
            source: ScheduleSource::User,
            user_id: Some(user_id),
            week: own.week(),
        });
    }
    Ok(default_schedule(pool, organization_id, Some(user_id)).await?)
}

async fn default_schedule(
    pool: &PgPool,
    organization_id: OrganizationId,
    user_id: Option<UserId>,
) -> Result<ScheduleResponse, sqlx::Error> {
    Ok(match schedule::find_org_default(pool, organization_id).await? {
        Some(default) => ScheduleResponse {
            source: ScheduleSource::Organization,
            user_id,
            week: default.week(),
        },
        None => ScheduleResponse {
            source: ScheduleSource::Builtin,
            user_id,
            week: WorkWeek::default(),
        },
    })
}

fn ensure_working_day(week: &WorkWeek) -> AppResult<()> {
    if week.has_working_day() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "A schedule needs at least one working day".into(),
        ))
    }
}

async fn ensure_member(state: &AppState, organization_id: OrganizationId, user_id: UserId) -> AppResult<()> {
    user_repo::find_in_org(&state.pool, organization_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(())
}

pub async fn my_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ScheduleResponse>> {
    Ok(Json(
        resolve_schedule(&state.pool, user.organization_id, user.id).await?,
    ))
}

pub async fn get_default_schedule(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> AppResult<Json<ScheduleResponse>> {
    Ok(Json(
        default_schedule(&state.pool, admin.organization_id, None).await?,
    ))
}

pub async fn put_default_schedule(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(week): Json<WorkWeek>,
) -> AppResult<Json<ScheduleResponse>> {
    ensure_working_day(&week)?;
    let stored = schedule::upsert_schedule(&state.pool, admin.organization_id, None, &week).await?;
    Ok(Json(ScheduleResponse {
        source: ScheduleSource::Organization,
        user_id: None,
        week: stored.week(),
    }))
}

pub async fn get_user_schedule(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<ScheduleResponse>> {
    ensure_member(&state, admin.organization_id, user_id).await?;
    Ok(Json(
        resolve_schedule(&state.pool, admin.organization_id, user_id).await?,
    ))
}

pub async fn put_user_schedule(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
    Json(week): Json<WorkWeek>,
) -> AppResult<Json<ScheduleResponse>> {
    ensure_working_day(&week)?;
    ensure_member(&state, admin.organization_id, user_id).await?;
    let stored =
        schedule::upsert_schedule(&state.pool, admin.organization_id, Some(user_id), &week).await?;
    Ok(Json(ScheduleResponse {
        source: ScheduleSource::User,
        user_id: Some(user_id),
        week: stored.week(),
    }))
}

/// Drops the override so the organization default applies again.
pub async fn delete_user_schedule(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<UserId>,
) -> AppResult<StatusCode> {
    let deleted =
        schedule::delete_user_schedule(&state.pool, admin.organization_id, user_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("User has no schedule override".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
