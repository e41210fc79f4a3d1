//! Billing webhook verification and parsing.
//!
//! The provider signs the raw request body with HMAC-SHA256 using the shared
//! webhook secret and sends the hex digest in `X-Signature`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{client::SubscriptionResource, BillingError, ProviderSubscription};
use crate::types::OrganizationId;

pub const SIGNATURE_HEADER: &str = "x-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionCancelled,
    SubscriptionResumed,
    SubscriptionExpired,
    SubscriptionPaused,
    SubscriptionUnpaused,
    Other,
}

impl WebhookEventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "subscription_created" => Self::SubscriptionCreated,
            "subscription_updated" => Self::SubscriptionUpdated,
            "subscription_cancelled" => Self::SubscriptionCancelled,
            "subscription_resumed" => Self::SubscriptionResumed,
            "subscription_expired" => Self::SubscriptionExpired,
            "subscription_paused" => Self::SubscriptionPaused,
            "subscription_unpaused" => Self::SubscriptionUnpaused,
            _ => Self::Other,
        }
    }

    pub fn affects_subscription(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Digest of the raw body, used to drop redeliveries.
    pub event_id: String,
    pub event_name: String,
    pub kind: WebhookEventKind,
    pub organization_id: Option<OrganizationId>,
    pub subscription: Option<ProviderSubscription>,
}

pub fn compute_signature(secret: &str, payload: &[u8]) -> Result<String, BillingError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::InvalidSignature)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies `signature` (hex) against the body in constant time.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> Result<(), BillingError> {
    let provided = hex::decode(signature.trim()).map_err(|_| BillingError::InvalidSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::InvalidSignature)?;
    mac.update(payload);
    mac.verify_slice(&provided)
        .map_err(|_| BillingError::InvalidSignature)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    meta: Meta,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    event_name: String,
    #[serde(default)]
    custom_data: Option<CustomData>,
}

#[derive(Debug, Deserialize)]
struct CustomData {
    #[serde(default)]
    organization_id: Option<String>,
}

pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent, BillingError> {
    let envelope: Envelope = serde_json::from_slice(payload)
        .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
    let kind = WebhookEventKind::parse(&envelope.meta.event_name);

    let organization_id = match envelope
        .meta
        .custom_data
        .and_then(|data| data.organization_id)
    {
        Some(raw) => Some(raw.parse::<OrganizationId>().map_err(|_| {
            BillingError::InvalidPayload(format!("invalid organization_id {}", raw))
        })?),
        None => None,
    };

    let subscription = match (kind.affects_subscription(), envelope.data) {
        (true, Some(data)) => {
            let resource: SubscriptionResource = serde_json::from_value(data)
                .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
            Some(resource.into_provider()?)
        }
        _ => None,
    };

    Ok(WebhookEvent {
        event_id: hex::encode(Sha256::digest(payload)),
        event_name: envelope.meta.event_name,
        kind,
        organization_id,
        subscription,
    })
}
