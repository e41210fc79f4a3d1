//! Deletes expired refresh tokens and revokes invitations past their expiry.

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use leavedesk_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{auth as auth_repo, invitation as invitation_repo},
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

    let deleted_tokens = auth_repo::cleanup_expired_refresh_tokens(&pool).await?;
    if deleted_tokens > 0 {
        tracing::info!("Deleted {} expired refresh tokens", deleted_tokens);
    }

    let revoked = invitation_repo::revoke_expired(&pool, Utc::now()).await?;
    if revoked > 0 {
        tracing::info!("Revoked {} expired invitations", revoked);
    }

    sqlx::query("VACUUM (ANALYZE) refresh_tokens")
        .execute(&pool)
        .await?;

    Ok(())
}
