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
        leave_type::{CreateLeaveType, LeaveType, UpdateLeaveType},
        user::User,
    },
    repositories::leave_type,
    state::AppState,
    types::LeaveTypeId,
};

/// Admins see inactive types too; everyone else only what can be requested.
pub async fn list_leave_types(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<LeaveType>>> {
    let types =
        leave_type::list_leave_types(&state.pool, user.organization_id, !user.is_admin()).await?;
    Ok(Json(types))
}

pub async fn create_leave_type(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(payload): Json<CreateLeaveType>,
) -> AppResult<(StatusCode, Json<LeaveType>)> {
    payload.validate()?;
    let now = Utc::now();
    let created = LeaveType {
        id: LeaveTypeId::new(),
        organization_id: admin.organization_id,
        name: payload.name.trim().to_string(),
        color: payload.color.to_uppercase(),
        deducts_balance: payload.deducts_balance,
        requires_approval: payload.requires_approval,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    leave_type::insert_leave_type(&state.pool, &created).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_leave_type(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<LeaveTypeId>,
    Json(payload): Json<UpdateLeaveType>,
) -> AppResult<Json<LeaveType>> {
    payload.validate()?;
    let mut current = leave_type::find_in_org(&state.pool, admin.organization_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave type not found".into()))?;
    if let Some(name) = payload.name {
        current.name = name.trim().to_string();
    }
    if let Some(color) = payload.color {
        current.color = color.to_uppercase();
    }
    if let Some(deducts_balance) = payload.deducts_balance {
        current.deducts_balance = deducts_balance;
    }
    if let Some(requires_approval) = payload.requires_approval {
        current.requires_approval = requires_approval;
    }
    if let Some(is_active) = payload.is_active {
        current.is_active = is_active;
    }
    let updated = leave_type::update_leave_type(&state.pool, &current).await?;
    Ok(Json(updated))
}
