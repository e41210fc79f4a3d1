use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        organization::{RegisterOrganization, RegisterResponse},
        user::{
            normalize_email, ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest,
            User, UserResponse,
        },
    },
    repositories::{auth as auth_repo, user as user_repo},
    services::organizations,
    state::AppState,
    utils::{
        cookies::{clear_session_cookie_headers, session_cookie_headers},
        jwt::{create_access_token, create_refresh_token, decode_refresh_token, verify_refresh_token},
        password::{hash_password, verify_password},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Issues an access token and a persisted refresh token for `user`.
async fn issue_session(state: &AppState, user: &User) -> AppResult<(String, String)> {
    let (access_token, _claims) = create_access_token(
        user.id,
        user.organization_id,
        user.role.as_str(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;
    let refresh = create_refresh_token(user.id, state.config.refresh_token_expiration_days)?;
    auth_repo::insert_refresh_token(&state.pool, &refresh).await?;
    Ok((access_token, refresh.encoded()))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterOrganization>,
) -> AppResult<(HeaderMap, Json<RegisterResponse>)> {
    payload.validate()?;
    let (organization, admin) =
        organizations::register_organization(&state.pool, &state.config, payload).await?;
    let (access_token, refresh_token) = issue_session(&state, &admin).await?;
    let headers = session_cookie_headers(&state.config, &access_token, &refresh_token);
    Ok((
        headers,
        Json(RegisterResponse {
            organization,
            user: UserResponse::from(admin),
            access_token,
            refresh_token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    payload.validate()?;
    let user = user_repo::find_by_email(&state.pool, &normalize_email(&payload.email))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    if !user.can_sign_in() {
        tracing::info!(user_id = %user.id, "Login refused for archived user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let (access_token, refresh_token) = issue_session(&state, &user).await?;
    let headers = session_cookie_headers(&state.config, &access_token, &refresh_token);
    Ok((
        headers,
        Json(LoginResponse {
            access_token,
            refresh_token,
            user: UserResponse::from(user),
        }),
    ))
}

/// Rotates the refresh token: the presented one is deleted and a new pair is
/// issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    payload.validate()?;
    let invalid = || AppError::Unauthorized("Invalid or expired refresh token".into());
    let (token_id, secret) = decode_refresh_token(&payload.refresh_token).map_err(|_| invalid())?;
    let stored = auth_repo::fetch_valid_refresh_token(&state.pool, &token_id, Utc::now())
        .await?
        .ok_or_else(invalid)?;
    if !verify_refresh_token(&secret, &stored.token_hash)? {
        return Err(invalid());
    }
    let user = user_repo::find_by_id(&state.pool, stored.user_id)
        .await?
        .filter(User::can_sign_in)
        .ok_or_else(invalid)?;

    auth_repo::delete_refresh_token_by_id(&state.pool, &stored.id).await?;
    let (access_token, refresh_token) = issue_session(&state, &user).await?;
    let headers = session_cookie_headers(&state.config, &access_token, &refresh_token);
    Ok((
        headers,
        Json(LoginResponse {
            access_token,
            refresh_token,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<(HeaderMap, Json<Value>)> {
    let revoked = auth_repo::delete_refresh_tokens_for_user(&state.pool, user.id).await?;
    tracing::debug!(user_id = %user.id, revoked, "User logged out");
    Ok((
        clear_session_cookie_headers(&state.config),
        Json(json!({"message": "Logged out"})),
    ))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    payload.validate()?;
    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    if payload.current_password == payload.new_password {
        return Err(AppError::BadRequest(
            "New password must differ from the current one".into(),
        ));
    }
    let password_hash = hash_password(&payload.new_password)?;
    user_repo::update_password(&state.pool, user.id, &password_hash).await?;
    auth_repo::delete_refresh_tokens_for_user(&state.pool, user.id).await?;
    Ok(Json(json!({"message": "Password changed"})))
}
