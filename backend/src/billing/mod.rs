//! Quantity-based subscription billing.
//!
//! The provider is the system of record for what an organization pays for;
//! the `subscriptions` table is a cache of it. [`BillingProvider`] is the seam
//! between the two so handlers and the reconcile job can run against a fake.

pub mod client;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::subscription::SubscriptionStatus;

pub use client::LemonSqueezyClient;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("billing provider is not configured")]
    NotConfigured,
    #[error("billing provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("billing provider request failed: {0}")]
    Transport(String),
    #[error("billing provider request timed out during {operation}")]
    Timeout { operation: String },
    #[error("unexpected billing payload: {0}")]
    InvalidPayload(String),
    #[error("invalid webhook signature")]
    InvalidSignature,
}

/// Subscription state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub item_id: Option<String>,
    pub quantity: u32,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl ProviderSubscription {
    pub fn paid_seats(&self, now: DateTime<Utc>) -> u32 {
        if self.status.grants_seats(self.ends_at, now) {
            self.quantity
        } else {
            0
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;

    /// Sets the seat quantity on a subscription item and returns the quantity
    /// the provider accepted.
    async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<u32, BillingError>;

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;

    async fn resume_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;
}

/// Provider used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBillingProvider;

#[async_trait]
impl BillingProvider for DisabledBillingProvider {
    async fn get_subscription(&self, _: &str) -> Result<ProviderSubscription, BillingError> {
        Err(BillingError::NotConfigured)
    }

    async fn update_quantity(&self, _: &str, _: u32) -> Result<u32, BillingError> {
        Err(BillingError::NotConfigured)
    }

    async fn cancel_subscription(&self, _: &str) -> Result<ProviderSubscription, BillingError> {
        Err(BillingError::NotConfigured)
    }

    async fn resume_subscription(&self, _: &str) -> Result<ProviderSubscription, BillingError> {
        Err(BillingError::NotConfigured)
    }
}
