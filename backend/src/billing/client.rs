//! HTTP client for the Lemon Squeezy subscription API (JSON:API over REST).
//!
//! Calls are retried with exponential backoff and jitter on rate limiting,
//! server errors, timeouts and connection failures.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{json, Value};

use super::{BillingError, BillingProvider, ProviderSubscription};
use crate::{config::BillingConfig, models::subscription::SubscriptionStatus};

const JSON_API: &str = "application/vnd.api+json";
const MAX_ERROR_MESSAGE_LEN: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl From<&BillingConfig> for RetryPolicy {
    fn from(config: &BillingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

#[derive(Clone)]
pub struct LemonSqueezyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl fmt::Debug for LemonSqueezyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemonSqueezyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("retry", &self.retry)
            .finish()
    }
}

impl LemonSqueezyClient {
    pub fn from_config(config: &BillingConfig) -> Result<Self, BillingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(BillingError::NotConfigured)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BillingError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::from(config),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, BillingError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempts = 0;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.api_key)
                .header(ACCEPT, JSON_API);
            if let Some(body) = &body {
                request = request.header(CONTENT_TYPE, JSON_API).body(body.to_string());
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| BillingError::InvalidPayload(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    BillingError::Api {
                        status,
                        message: api_error_message(&body),
                    }
                }
                Err(err) if err.is_timeout() => BillingError::Timeout {
                    operation: operation.to_string(),
                },
                Err(err) => BillingError::Transport(err.to_string()),
            };

            if !is_retryable(&error) || attempts >= self.retry.max_retries {
                return Err(error);
            }

            let delay = calculate_backoff_delay(
                attempts,
                self.retry.base_delay_ms,
                self.retry.max_delay_ms,
            );
            tracing::warn!(
                operation,
                attempt = attempts + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying billing provider call after transient error"
            );
            tokio::time::sleep(delay).await;
            attempts += 1;
        }
    }
}

#[async_trait]
impl BillingProvider for LemonSqueezyClient {
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let document: SubscriptionDocument = self
            .execute(
                "get_subscription",
                Method::GET,
                &format!("subscriptions/{}", subscription_id),
                None,
            )
            .await?;
        document.data.into_provider()
    }

    async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<u32, BillingError> {
        let body = json!({
            "data": {
                "type": "subscription-items",
                "id": item_id,
                "attributes": { "quantity": quantity }
            }
        });
        let document: SubscriptionItemDocument = self
            .execute(
                "update_quantity",
                Method::PATCH,
                &format!("subscription-items/{}", item_id),
                Some(body),
            )
            .await?;
        Ok(document.data.attributes.quantity)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let document: SubscriptionDocument = self
            .execute(
                "cancel_subscription",
                Method::DELETE,
                &format!("subscriptions/{}", subscription_id),
                None,
            )
            .await?;
        document.data.into_provider()
    }

    async fn resume_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let body = json!({
            "data": {
                "type": "subscriptions",
                "id": subscription_id,
                "attributes": { "cancelled": false }
            }
        });
        let document: SubscriptionDocument = self
            .execute(
                "resume_subscription",
                Method::PATCH,
                &format!("subscriptions/{}", subscription_id),
                Some(body),
            )
            .await?;
        document.data.into_provider()
    }
}

fn is_retryable(error: &BillingError) -> bool {
    match error {
        BillingError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        BillingError::Timeout { .. } | BillingError::Transport(_) => true,
        _ => false,
    }
}

/// Exponential backoff (`base * 2^attempt`, capped at `max`) plus up to 25%
/// jitter.
pub fn calculate_backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = base_ms
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(max_ms);
    let jitter = if delay_ms > 0 {
        rand::thread_rng().gen_range(0..=delay_ms / 4)
    } else {
        0
    };
    Duration::from_millis(delay_ms.saturating_add(jitter))
}

fn api_error_message(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        let first = value.get("errors")?.get(0)?;
        first
            .get("detail")
            .or_else(|| first.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let mut message = detail.unwrap_or_else(|| body.to_string());
    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let cut = (0..=MAX_ERROR_MESSAGE_LEN)
            .rev()
            .find(|idx| message.is_char_boundary(*idx))
            .unwrap_or(0);
        message.truncate(cut);
    }
    message
}

// JSON:API documents. Ids arrive as numbers or strings depending on endpoint.

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionDocument {
    pub data: SubscriptionResource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionResource {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub attributes: SubscriptionAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionAttributes {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub customer_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub renews_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_subscription_item: Option<SubscriptionItemAttributes>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscriptionItemAttributes {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItemDocument {
    data: SubscriptionItemResource,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItemResource {
    attributes: QuantityAttributes,
}

#[derive(Debug, Deserialize)]
struct QuantityAttributes {
    quantity: u32,
}

impl SubscriptionResource {
    pub(crate) fn into_provider(self) -> Result<ProviderSubscription, BillingError> {
        let status = SubscriptionStatus::parse(&self.attributes.status).ok_or_else(|| {
            BillingError::InvalidPayload(format!(
                "unknown subscription status {}",
                self.attributes.status
            ))
        })?;
        // Without the item there is no seat quantity to trust.
        let item = self.attributes.first_subscription_item.ok_or_else(|| {
            BillingError::InvalidPayload(format!(
                "subscription {} has no subscription item",
                self.id
            ))
        })?;
        Ok(ProviderSubscription {
            id: self.id,
            customer_id: self.attributes.customer_id,
            status,
            item_id: Some(item.id),
            quantity: item.quantity,
            renews_at: self.attributes.renews_at,
            ends_at: self.attributes.ends_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_is_capped() {
        let delay0 = calculate_backoff_delay(0, 100, 10_000);
        assert!(delay0 >= Duration::from_millis(100) && delay0 <= Duration::from_millis(125));

        let delay2 = calculate_backoff_delay(2, 100, 10_000);
        assert!(delay2 >= Duration::from_millis(400) && delay2 <= Duration::from_millis(500));

        let capped = calculate_backoff_delay(20, 100, 1_000);
        assert!(capped >= Duration::from_millis(1_000) && capped <= Duration::from_millis(1_250));
    }

    #[test]
    fn backoff_with_zero_base_is_immediate() {
        assert_eq!(calculate_backoff_delay(3, 0, 1_000), Duration::ZERO);
    }

    #[test]
    fn only_rate_limits_server_errors_and_network_failures_retry() {
        let api = |status| BillingError::Api {
            status,
            message: String::new(),
        };
        assert!(is_retryable(&api(429)));
        assert!(is_retryable(&api(503)));
        assert!(!is_retryable(&api(404)));
        assert!(!is_retryable(&api(422)));
        assert!(is_retryable(&BillingError::Transport("reset".into())));
        assert!(is_retryable(&BillingError::Timeout {
            operation: "x".into()
        }));
        assert!(!is_retryable(&BillingError::InvalidPayload("x".into())));
    }

    #[test]
    fn parses_subscription_document_with_numeric_ids() {
        let body = json!({
            "data": {
                "type": "subscriptions",
                "id": "42",
                "attributes": {
                    "customer_id": 7,
                    "status": "active",
                    "renews_at": "2025-02-01T00:00:00.000000Z",
                    "ends_at": null,
                    "first_subscription_item": { "id": 99, "quantity": 5 }
                }
            }
        });
        let document: SubscriptionDocument = serde_json::from_value(body).unwrap();
        let sub = document.data.into_provider().unwrap();
        assert_eq!(sub.id, "42");
        assert_eq!(sub.customer_id.as_deref(), Some("7"));
        assert_eq!(sub.item_id.as_deref(), Some("99"));
        assert_eq!(sub.quantity, 5);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.renews_at.is_some());
        assert!(sub.ends_at.is_none());
    }

    #[test]
    fn subscription_without_item_is_rejected() {
        let body = json!({
            "data": {
                "type": "subscriptions",
                "id": "1001",
                "attributes": { "status": "active" }
            }
        });
        let document: SubscriptionDocument = serde_json::from_value(body).unwrap();
        assert!(matches!(
            document.data.into_provider(),
            Err(BillingError::InvalidPayload(_))
        ));

        let body = json!({
            "data": {
                "type": "subscriptions",
                "id": "1001",
                "attributes": { "status": "active", "first_subscription_item": { "id": 9 } }
            }
        });
        assert!(serde_json::from_value::<SubscriptionDocument>(body).is_err());
    }

    #[test]
    fn unknown_status_is_an_invalid_payload() {
        let body = json!({
            "data": { "id": 1, "attributes": { "status": "mystery" } }
        });
        let document: SubscriptionDocument = serde_json::from_value(body).unwrap();
        assert!(matches!(
            document.data.into_provider(),
            Err(BillingError::InvalidPayload(_))
        ));
    }

    #[test]
    fn api_error_message_prefers_json_api_detail() {
        let body = r#"{"errors":[{"status":"422","title":"Unprocessable","detail":"quantity must be positive"}]}"#;
        assert_eq!(api_error_message(body), "quantity must be positive");
        assert_eq!(api_error_message("plain failure"), "plain failure");
        assert_eq!(api_error_message(&"x".repeat(1000)).len(), MAX_ERROR_MESSAGE_LEN);
    }

    #[test]
    fn client_requires_api_key_and_hides_it_in_debug() {
        let config = BillingConfig::default();
        assert!(matches!(
            LemonSqueezyClient::from_config(&config),
            Err(BillingError::NotConfigured)
        ));

        let config = BillingConfig {
            api_key: Some("sk_very_secret".into()),
            ..BillingConfig::default()
        };
        let client = LemonSqueezyClient::from_config(&config).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk_very_secret"));
        assert!(debug.contains("REDACTED"));
    }
}
