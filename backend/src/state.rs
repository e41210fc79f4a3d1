use std::sync::Arc;

use crate::{
    billing::BillingProvider, config::Config, db::connection::DbPool, seats::SeatPolicy,
    utils::email::EmailService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub billing: Arc<dyn BillingProvider>,
    pub email: EmailService,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Config,
        billing: Arc<dyn BillingProvider>,
        email: EmailService,
    ) -> Self {
        Self {
            pool,
            config,
            billing,
            email,
        }
    }

    pub fn seat_policy(&self) -> SeatPolicy {
        SeatPolicy::new(self.config.free_seat_count)
    }
}
