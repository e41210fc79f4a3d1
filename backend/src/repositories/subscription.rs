//! Local cache of the provider subscription.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::{
    billing::ProviderSubscription, models::subscription::Subscription, types::OrganizationId,
};

const SUBSCRIPTION_COLUMNS: &str = "organization_id, provider_subscription_id, provider_item_id, \
     provider_customer_id, status, quantity, renews_at, ends_at, last_synced_at, created_at, updated_at";

pub async fn find_by_organization(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE organization_id = $1"
    ))
    .bind(organization_id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_provider_id(
    db: impl PgExecutor<'_>,
    provider_subscription_id: &str,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE provider_subscription_id = $1"
    ))
    .bind(provider_subscription_id)
    .fetch_optional(db)
    .await
}

/// Writes the provider's view of the subscription and stamps `last_synced_at`.
pub async fn upsert_from_provider(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    provider: &ProviderSubscription,
    synced_at: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (organization_id, provider_subscription_id, provider_item_id,
            provider_customer_id, status, quantity, renews_at, ends_at, last_synced_at,
            created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $9)
        ON CONFLICT (organization_id) DO UPDATE SET
            provider_subscription_id = EXCLUDED.provider_subscription_id,
            provider_item_id = COALESCE(EXCLUDED.provider_item_id, subscriptions.provider_item_id),
            provider_customer_id = COALESCE(EXCLUDED.provider_customer_id, subscriptions.provider_customer_id),
            status = EXCLUDED.status,
            quantity = EXCLUDED.quantity,
            renews_at = EXCLUDED.renews_at,
            ends_at = EXCLUDED.ends_at,
            last_synced_at = EXCLUDED.last_synced_at,
            updated_at = EXCLUDED.updated_at
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(organization_id)
    .bind(&provider.id)
    .bind(&provider.item_id)
    .bind(&provider.customer_id)
    .bind(provider.status)
    .bind(i32::try_from(provider.quantity).unwrap_or(i32::MAX))
    .bind(provider.renews_at)
    .bind(provider.ends_at)
    .bind(synced_at)
    .fetch_one(db)
    .await
}

pub async fn update_quantity(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    quantity: u32,
    synced_at: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "UPDATE subscriptions SET quantity = $2, last_synced_at = $3, updated_at = $3 \
         WHERE organization_id = $1 RETURNING {SUBSCRIPTION_COLUMNS}"
    ))
    .bind(organization_id)
    .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
    .bind(synced_at)
    .fetch_one(db)
    .await
}

pub async fn touch_synced(
    db: impl PgExecutor<'_>,
    organization_id: OrganizationId,
    synced_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subscriptions SET last_synced_at = $2 WHERE organization_id = $1")
        .bind(organization_id)
        .bind(synced_at)
        .execute(db)
        .await
        .map(|_| ())
}

/// Organizations with a cached subscription row.
pub async fn list_organization_ids(
    db: impl PgExecutor<'_>,
) -> Result<Vec<OrganizationId>, sqlx::Error> {
    sqlx::query_scalar::<_, OrganizationId>(
        "SELECT organization_id FROM subscriptions ORDER BY organization_id",
    )
    .fetch_all(db)
    .await
}

/// Records a webhook delivery. Returns `false` when it was already seen.
pub async fn record_billing_event(
    db: impl PgExecutor<'_>,
    event_id: &str,
    event_name: &str,
    organization_id: Option<OrganizationId>,
) -> Result<bool, sqlx::Error> {
    sqlx::query(
        "INSERT INTO billing_events (id, event_name, organization_id) VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(event_id)
    .bind(event_name)
    .bind(organization_id)
    .execute(db)
    .await
    .map(|result| result.rows_affected() == 1)
}
