use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        leave_balance::{AdjustLeaveBalance, LeaveBalanceResponse},
        user::User,
    },
    repositories::leave_balance,
    services::leave,
    state::AppState,
    types::LeaveBalanceId,
    utils::time::{leave_year_bounds, today_local},
};

pub async fn my_balances(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<LeaveBalanceResponse>>> {
    let org = leave::load_organization(&state.pool, user.organization_id).await?;
    let today = today_local(&state.config.time_zone);
    Ok(Json(
        leave::balances_for_user(&state.pool, &org, user.id, today).await?,
    ))
}

pub async fn adjust_balance(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<LeaveBalanceId>,
    Json(payload): Json<AdjustLeaveBalance>,
) -> AppResult<Json<LeaveBalanceResponse>> {
    payload.validate()?;
    let current = leave_balance::find_in_org(&state.pool, admin.organization_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave balance not found".into()))?;
    let updated = leave_balance::adjust_balance(
        &state.pool,
        id,
        payload.allocated_days.unwrap_or(current.allocated_days),
        payload.carried_over_days.unwrap_or(current.carried_over_days),
    )
    .await?;
    tracing::info!(
        balance_id = %id,
        user_id = %updated.user_id,
        allocated = updated.allocated_days,
        carried_over = updated.carried_over_days,
        "Leave balance adjusted"
    );

    let org = leave::load_organization(&state.pool, admin.organization_id).await?;
    let (start, end) = leave_year_bounds(updated.year, org.start_month());
    leave_balance::list_for_user(&state.pool, updated.user_id, updated.year, start, end)
        .await?
        .into_iter()
        .find(|balance| balance.id == id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Leave balance not found".into()))
}
