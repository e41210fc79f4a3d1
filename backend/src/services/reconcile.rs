//! Reconciles the cached subscription row with the billing provider.
//!
//! The provider is the source of truth for billing state. When it cannot be
//! reached the cached row is used so seat numbers are still reported.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::{
    billing::{BillingProvider, ProviderSubscription},
    models::subscription::Subscription,
    repositories::{self, subscription},
    seats::{self, SeatPolicy, SeatSummary},
    types::OrganizationId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    InSync,
    UpdatedLocal,
    ProviderUnavailable,
    NoSubscription,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Report differences without writing them.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub organization_id: OrganizationId,
    pub outcome: ReconcileOutcome,
    pub local_quantity_before: Option<u32>,
    pub provider_quantity: Option<u32>,
    /// Fields that differed between the cached row and the provider.
    pub changed_fields: Vec<String>,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary: SeatSummary,
}

/// Names of the fields where the cached row disagrees with the provider.
pub fn diff_subscription(local: &Subscription, remote: &ProviderSubscription) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if local.provider_subscription_id != remote.id {
        changed.push("provider_subscription_id");
    }
    if local.status != remote.status {
        changed.push("status");
    }
    if i64::from(local.quantity) != i64::from(remote.quantity) {
        changed.push("quantity");
    }
    if remote.item_id.is_some() && local.provider_item_id != remote.item_id {
        changed.push("provider_item_id");
    }
    if remote.customer_id.is_some() && local.provider_customer_id != remote.customer_id {
        changed.push("provider_customer_id");
    }
    if local.renews_at != remote.renews_at {
        changed.push("renews_at");
    }
    if local.ends_at != remote.ends_at {
        changed.push("ends_at");
    }
    changed
}

fn local_quantity(sub: &Subscription) -> u32 {
    u32::try_from(sub.quantity).unwrap_or(0)
}

pub async fn reconcile_organization(
    pool: &PgPool,
    provider: &dyn BillingProvider,
    policy: SeatPolicy,
    organization_id: OrganizationId,
    options: ReconcileOptions,
) -> Result<ReconcileReport, sqlx::Error> {
    let now: DateTime<Utc> = Utc::now();
    let usage = repositories::load_seat_usage(pool, organization_id, now).await?;
    let Some(local) = subscription::find_by_organization(pool, organization_id).await? else {
        let summary = seats::summarize(policy, 0, usage);
        warn_if_over_capacity(organization_id, &summary);
        return Ok(ReconcileReport {
            organization_id,
            outcome: ReconcileOutcome::NoSubscription,
            local_quantity_before: None,
            provider_quantity: None,
            changed_fields: Vec::new(),
            dry_run: options.dry_run,
            error: None,
            summary,
        });
    };

    let remote = match provider.get_subscription(&local.provider_subscription_id).await {
        Ok(remote) => remote,
        Err(err) => {
            tracing::warn!(
                organization_id = %organization_id,
                error = %err,
                "Billing provider unavailable; using cached subscription"
            );
            let summary = seats::summarize(policy, local.paid_seats(now), usage);
            warn_if_over_capacity(organization_id, &summary);
            return Ok(ReconcileReport {
                organization_id,
                outcome: ReconcileOutcome::ProviderUnavailable,
                local_quantity_before: Some(local_quantity(&local)),
                provider_quantity: None,
                changed_fields: Vec::new(),
                dry_run: options.dry_run,
                error: Some(err.to_string()),
                summary,
            });
        }
    };

    let changed_fields: Vec<String> = diff_subscription(&local, &remote)
        .into_iter()
        .map(str::to_string)
        .collect();
    let outcome = if changed_fields.is_empty() {
        ReconcileOutcome::InSync
    } else {
        ReconcileOutcome::UpdatedLocal
    };

    if !options.dry_run {
        if changed_fields.is_empty() {
            subscription::touch_synced(pool, organization_id, now).await?;
        } else {
            subscription::upsert_from_provider(pool, organization_id, &remote, now).await?;
            tracing::info!(
                organization_id = %organization_id,
                changed = ?changed_fields,
                quantity = remote.quantity,
                status = remote.status.as_str(),
                "Local subscription updated from provider"
            );
        }
    }

    let summary = seats::summarize(policy, remote.paid_seats(now), usage);
    warn_if_over_capacity(organization_id, &summary);
    Ok(ReconcileReport {
        organization_id,
        outcome,
        local_quantity_before: Some(local_quantity(&local)),
        provider_quantity: Some(remote.quantity),
        changed_fields,
        dry_run: options.dry_run,
        error: None,
        summary,
    })
}

fn warn_if_over_capacity(organization_id: OrganizationId, summary: &SeatSummary) {
    if summary.over_capacity {
        tracing::warn!(
            organization_id = %organization_id,
            used = summary.used_seats,
            total = summary.total_seats,
            "Organization uses more seats than it has"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::SubscriptionStatus;

    fn local() -> Subscription {
        let now = Utc::now();
        Subscription {
            organization_id: OrganizationId::new(),
            provider_subscription_id: "sub_1".into(),
            provider_item_id: Some("item_1".into()),
            provider_customer_id: Some("cus_1".into()),
            status: SubscriptionStatus::Active,
            quantity: 2,
            renews_at: None,
            ends_at: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn remote() -> ProviderSubscription {
        ProviderSubscription {
            id: "sub_1".into(),
            customer_id: Some("cus_1".into()),
            status: SubscriptionStatus::Active,
            item_id: Some("item_1".into()),
            quantity: 2,
            renews_at: None,
            ends_at: None,
        }
    }

    #[test]
    fn identical_state_has_no_diff() {
        assert!(diff_subscription(&local(), &remote()).is_empty());
    }

    #[test]
    fn quantity_and_status_differences_are_reported() {
        let mut remote = remote();
        remote.quantity = 5;
        remote.status = SubscriptionStatus::PastDue;
        assert_eq!(diff_subscription(&local(), &remote), vec!["status", "quantity"]);
    }

    #[test]
    fn missing_remote_item_is_not_a_difference() {
        let mut remote = remote();
        remote.item_id = None;
        remote.customer_id = None;
        assert!(diff_subscription(&local(), &remote).is_empty());
    }
}
