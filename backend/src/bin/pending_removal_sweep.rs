//! Archives members whose scheduled removal date has arrived. Meant to run
//! daily from cron.

use tracing_subscriber::EnvFilter;

use leavedesk_backend::{
    config::Config, db::connection::create_pool, services::members::apply_due_removals,
    utils::time::today_local,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "leavedesk_backend=info".into()),
        )
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let today = today_local(&config.time_zone);
    let archived = apply_due_removals(&pool, today).await?;
    tracing::info!(today = %today, archived, "Pending removal sweep finished");
    Ok(())
}
