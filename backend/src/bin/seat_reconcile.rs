//! Compares every cached subscription with the billing provider.
//!
//! Prints one JSON report per organization on stdout. `--dry-run` reports
//! differences without writing them. Due pending removals are applied first
//! so the seat summaries reflect today's membership.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use leavedesk_backend::{
    billing::{BillingProvider, DisabledBillingProvider, LemonSqueezyClient},
    config::Config,
    db::connection::create_pool,
    repositories::subscription,
    seats::SeatPolicy,
    services::{
        members::apply_due_removals,
        reconcile::{reconcile_organization, ReconcileOptions, ReconcileOutcome},
    },
    utils::time::today_local,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "leavedesk_backend=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let dry_run = std::env::args().skip(1).any(|arg| arg == "--dry-run");
    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    let provider: Arc<dyn BillingProvider> = if config.billing.is_enabled() {
        Arc::new(LemonSqueezyClient::from_config(&config.billing)?)
    } else {
        tracing::warn!("Billing API key not set; reporting cached subscriptions only");
        Arc::new(DisabledBillingProvider)
    };
    let policy = SeatPolicy::new(config.free_seat_count);

    if !dry_run {
        let archived = apply_due_removals(&pool, today_local(&config.time_zone)).await?;
        tracing::info!(archived, "Applied due pending removals");
    }

    let mut unavailable = 0usize;
    let organization_ids = subscription::list_organization_ids(&pool).await?;
    for organization_id in organization_ids {
        let report = reconcile_organization(
            &pool,
            provider.as_ref(),
            policy,
            organization_id,
            ReconcileOptions { dry_run },
        )
        .await
        .with_context(|| format!("reconcile organization {}", organization_id))?;
        if report.outcome == ReconcileOutcome::ProviderUnavailable {
            unavailable += 1;
        }
        println!("{}", serde_json::to_string(&report)?);
    }

    if unavailable > 0 {
        tracing::warn!(unavailable, "Some organizations could not be checked against the provider");
    }
    Ok(())
}
