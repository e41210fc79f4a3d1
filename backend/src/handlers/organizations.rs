use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        organization::{Organization, UpdateOrganization},
        user::User,
    },
    repositories::organization,
    services::leave::load_organization,
    state::AppState,
};

pub async fn get_current(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Organization>> {
    Ok(Json(load_organization(&state.pool, user.organization_id).await?))
}

pub async fn update_current(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateOrganization>,
) -> AppResult<Json<Organization>> {
    payload.validate()?;
    let mut org = load_organization(&state.pool, user.organization_id).await?;
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Organization name cannot be blank".into()));
        }
        org.name = name;
    }
    if let Some(country_code) = payload.country_code {
        org.country_code = Some(country_code.to_uppercase());
    }
    if let Some(month) = payload.leave_year_start_month {
        org.leave_year_start_month = month;
    }
    if let Some(allowance) = payload.default_annual_allowance {
        org.default_annual_allowance = allowance;
    }
    org.updated_at = Utc::now();

    let updated = organization::update_organization(&state.pool, &org).await?;
    tracing::info!(organization_id = %updated.id, "Organization settings updated");
    Ok(Json(updated))
}
