//! Seat capacity checks and paid-quantity changes backed by the billing provider.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use utoipa::ToSchema;

use crate::{
    billing::{webhook::WebhookEvent, BillingProvider},
    error::{AppError, AppResult},
    models::subscription::{Subscription, SubscriptionResponse},
    repositories::{self, organization, subscription},
    seats::{self, SeatError, SeatPolicy, SeatSummary, SeatUsage},
    types::OrganizationId,
};

/// Largest paid quantity accepted from the API.
pub const MAX_PAID_SEATS: u32 = 10_000;

#[derive(Debug, Serialize, ToSchema)]
pub struct SeatOverview {
    #[serde(flatten)]
    pub summary: SeatSummary,
    /// Paid seats needed once pending removals take effect.
    pub billable_quantity: u32,
    pub subscription: Option<SubscriptionResponse>,
}

pub struct SeatSnapshot {
    pub summary: SeatSummary,
    pub usage: SeatUsage,
    pub subscription: Option<Subscription>,
}

/// Computes the seat summary from the cached subscription row. The provider
/// is not contacted.
pub async fn seat_snapshot(
    conn: &mut PgConnection,
    policy: SeatPolicy,
    organization_id: OrganizationId,
    now: DateTime<Utc>,
) -> Result<SeatSnapshot, sqlx::Error> {
    let subscription = subscription::find_by_organization(&mut *conn, organization_id).await?;
    let usage = repositories::load_seat_usage(&mut *conn, organization_id, now).await?;
    let paid = subscription
        .as_ref()
        .map(|sub| sub.paid_seats(now))
        .unwrap_or(0);
    Ok(SeatSnapshot {
        summary: seats::summarize(policy, paid, usage),
        usage,
        subscription,
    })
}

pub async fn get_seat_overview(
    pool: &PgPool,
    policy: SeatPolicy,
    organization_id: OrganizationId,
) -> AppResult<SeatOverview> {
    let mut conn = pool.acquire().await?;
    let snapshot = seat_snapshot(&mut conn, policy, organization_id, Utc::now()).await?;
    Ok(SeatOverview {
        billable_quantity: policy.billable_quantity(&snapshot.usage),
        summary: snapshot.summary,
        subscription: snapshot.subscription.map(SubscriptionResponse::from),
    })
}

/// Locks the organization and checks that `requested` more seats fit. The
/// lock is held by `conn`'s transaction until it commits, so callers must
/// consume the seat inside the same transaction.
pub async fn reserve_seats(
    conn: &mut PgConnection,
    policy: SeatPolicy,
    organization_id: OrganizationId,
    requested: u32,
) -> AppResult<SeatSummary> {
    organization::lock_for_seat_change(&mut *conn, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    let snapshot = seat_snapshot(conn, policy, organization_id, Utc::now()).await?;
    seats::ensure_capacity(&snapshot.summary, requested)?;
    Ok(snapshot.summary)
}

fn validate_requested_quantity(quantity: u32) -> Result<(), SeatError> {
    if quantity == 0 {
        return Err(SeatError::InvalidQuantity(
            "Paid seats cannot be set to 0; cancel the subscription instead".into(),
        ));
    }
    if quantity > MAX_PAID_SEATS {
        return Err(SeatError::InvalidQuantity(format!(
            "Paid seats cannot exceed {}",
            MAX_PAID_SEATS
        )));
    }
    Ok(())
}

/// Changes the paid quantity at the provider, then stores the quantity the
/// provider accepted. Nothing is written locally when the provider fails.
pub async fn update_paid_seats(
    pool: &PgPool,
    provider: &dyn BillingProvider,
    policy: SeatPolicy,
    organization_id: OrganizationId,
    new_quantity: u32,
) -> AppResult<SeatOverview> {
    validate_requested_quantity(new_quantity)?;

    let mut tx = repositories::begin_transaction(pool).await?;
    organization::lock_for_seat_change(&mut *tx, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    let now = Utc::now();
    let usage = repositories::load_seat_usage(&mut *tx, organization_id, now).await?;
    seats::validate_downgrade(policy, usage, new_quantity)?;

    let current = subscription::find_by_organization(&mut *tx, organization_id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Organization has no subscription; subscribe before adding seats".into())
        })?;
    let item_id = current.provider_item_id.as_deref().ok_or_else(|| {
        AppError::Conflict("Subscription has no seat item to update".into())
    })?;

    let accepted = provider.update_quantity(item_id, new_quantity).await?;
    if accepted != new_quantity {
        tracing::warn!(
            organization_id = %organization_id,
            requested = new_quantity,
            accepted,
            "Billing provider accepted a different seat quantity"
        );
    }
    let updated = subscription::update_quantity(&mut *tx, organization_id, accepted, now).await?;
    repositories::commit_transaction(tx).await?;

    tracing::info!(
        organization_id = %organization_id,
        previous = current.quantity,
        quantity = accepted,
        "Paid seat quantity updated"
    );

    let summary = seats::summarize(policy, updated.paid_seats(now), usage);
    Ok(SeatOverview {
        billable_quantity: policy.billable_quantity(&usage),
        summary,
        subscription: Some(updated.into()),
    })
}

#[derive(Debug, Clone, Copy)]
pub enum SubscriptionAction {
    Cancel,
    Resume,
}

pub async fn change_subscription_state(
    pool: &PgPool,
    provider: &dyn BillingProvider,
    organization_id: OrganizationId,
    action: SubscriptionAction,
) -> AppResult<SubscriptionResponse> {
    let current = subscription::find_by_organization(pool, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization has no subscription".into()))?;

    let remote = match action {
        SubscriptionAction::Cancel => {
            provider
                .cancel_subscription(&current.provider_subscription_id)
                .await?
        }
        SubscriptionAction::Resume => {
            provider
                .resume_subscription(&current.provider_subscription_id)
                .await?
        }
    };
    let stored =
        subscription::upsert_from_provider(pool, organization_id, &remote, Utc::now()).await?;
    tracing::info!(
        organization_id = %organization_id,
        action = ?action,
        status = stored.status.as_str(),
        "Subscription state changed"
    );
    Ok(stored.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied,
    Duplicate,
    Ignored,
}

/// Applies a verified webhook. The delivery is recorded in the same
/// transaction so a failed apply is retried by the provider.
pub async fn apply_webhook_event(pool: &PgPool, event: WebhookEvent) -> AppResult<WebhookOutcome> {
    let mut tx = repositories::begin_transaction(pool).await?;
    let first_delivery = subscription::record_billing_event(
        &mut *tx,
        &event.event_id,
        &event.event_name,
        event.organization_id,
    )
    .await?;
    if !first_delivery {
        repositories::rollback_transaction(tx).await?;
        tracing::debug!(event_id = %event.event_id, "Duplicate billing webhook ignored");
        return Ok(WebhookOutcome::Duplicate);
    }

    let Some(remote) = event.subscription.filter(|_| event.kind.affects_subscription()) else {
        repositories::commit_transaction(tx).await?;
        tracing::debug!(event = %event.event_name, "Billing webhook ignored");
        return Ok(WebhookOutcome::Ignored);
    };

    let organization_id = match event.organization_id {
        Some(id) => Some(id),
        None => subscription::find_by_provider_id(&mut *tx, &remote.id)
            .await?
            .map(|sub| sub.organization_id),
    };
    let organization_id = match organization_id {
        Some(id) if organization::find_by_id(&mut *tx, id).await?.is_some() => id,
        _ => {
            repositories::commit_transaction(tx).await?;
            tracing::warn!(
                event = %event.event_name,
                subscription_id = %remote.id,
                "Billing webhook does not match any organization"
            );
            return Ok(WebhookOutcome::Ignored);
        }
    };

    let stored =
        subscription::upsert_from_provider(&mut *tx, organization_id, &remote, Utc::now()).await?;
    repositories::commit_transaction(tx).await?;
    tracing::info!(
        organization_id = %organization_id,
        event = %event.event_name,
        status = stored.status.as_str(),
        quantity = stored.quantity,
        "Subscription updated from webhook"
    );
    Ok(WebhookOutcome::Applied)
}
