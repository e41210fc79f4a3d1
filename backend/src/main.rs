use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leavedesk_backend::{
    billing::{BillingProvider, DisabledBillingProvider, LemonSqueezyClient},
    build_router,
    config::{mask_secret, Config},
    db::connection::{create_pool, DbPool},
    state::AppState,
    utils::email::EmailService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leavedesk_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        refresh_token_expiration_days = config.refresh_token_expiration_days,
        time_zone = %config.time_zone,
        free_seat_count = config.free_seat_count,
        billing_enabled = config.billing.is_enabled(),
        smtp_enabled = config.smtp.is_some(),
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let billing: Arc<dyn BillingProvider> = if config.billing.is_enabled() {
        Arc::new(LemonSqueezyClient::from_config(&config.billing)?)
    } else {
        tracing::warn!("Billing API key not set; paid seat changes are disabled");
        Arc::new(DisabledBillingProvider)
    };
    let email = EmailService::from_config(&config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = build_router(AppState::new(pool, config, billing, email));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
