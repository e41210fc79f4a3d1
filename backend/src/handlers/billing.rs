use axum::{
    body::Bytes,
    extract::{Extension, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    billing::{
        webhook::{parse_event, verify_signature, SIGNATURE_HEADER},
        BillingError,
    },
    error::AppResult,
    models::{subscription::SubscriptionResponse, user::User},
    services::{
        billing::{self, SeatOverview, SubscriptionAction, WebhookOutcome},
        reconcile::{self, ReconcileOptions, ReconcileReport},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSeatsRequest {
    /// New paid seat quantity on top of the free tier.
    pub paid_seats: u32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReconcileParams {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub outcome: WebhookOutcome,
}

/// Seat usage from the cached subscription; the provider is not contacted.
pub async fn get_seats(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> AppResult<Json<SeatOverview>> {
    let overview =
        billing::get_seat_overview(&state.pool, state.seat_policy(), admin.organization_id).await?;
    Ok(Json(overview))
}

pub async fn update_seats(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(payload): Json<UpdateSeatsRequest>,
) -> AppResult<Json<SeatOverview>> {
    let overview = billing::update_paid_seats(
        &state.pool,
        state.billing.as_ref(),
        state.seat_policy(),
        admin.organization_id,
        payload.paid_seats,
    )
    .await?;
    Ok(Json(overview))
}

pub async fn reconcile_seats(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Query(params): Query<ReconcileParams>,
) -> AppResult<Json<ReconcileReport>> {
    let report = reconcile::reconcile_organization(
        &state.pool,
        state.billing.as_ref(),
        state.seat_policy(),
        admin.organization_id,
        ReconcileOptions {
            dry_run: params.dry_run,
        },
    )
    .await?;
    Ok(Json(report))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> AppResult<Json<SubscriptionResponse>> {
    let updated = billing::change_subscription_state(
        &state.pool,
        state.billing.as_ref(),
        admin.organization_id,
        SubscriptionAction::Cancel,
    )
    .await?;
    Ok(Json(updated))
}

pub async fn resume_subscription(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> AppResult<Json<SubscriptionResponse>> {
    let updated = billing::change_subscription_state(
        &state.pool,
        state.billing.as_ref(),
        admin.organization_id,
        SubscriptionAction::Resume,
    )
    .await?;
    Ok(Json(updated))
}

/// Provider webhook. The raw body is needed for the signature check.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let secret = state
        .config
        .billing
        .webhook_secret
        .as_deref()
        .ok_or(BillingError::NotConfigured)?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(BillingError::InvalidSignature)?;
    verify_signature(secret, &body, signature)?;
    let event = parse_event(&body)?;
    let outcome = billing::apply_webhook_event(&state.pool, event).await?;
    Ok(Json(WebhookAck { outcome }))
}
