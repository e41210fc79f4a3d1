//! Local copy of an organization's subscription at the billing provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::OrganizationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    OnTrial,
    Active,
    Paused,
    PastDue,
    Unpaid,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::OnTrial => "on_trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "on_trial" => Some(SubscriptionStatus::OnTrial),
            "active" => Some(SubscriptionStatus::Active),
            "paused" => Some(SubscriptionStatus::Paused),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "unpaid" => Some(SubscriptionStatus::Unpaid),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Whether the paid quantity still grants seats. A cancelled subscription
    /// keeps its seats until `ends_at`.
    pub fn grants_seats(&self, ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            SubscriptionStatus::OnTrial
            | SubscriptionStatus::Active
            | SubscriptionStatus::PastDue
            | SubscriptionStatus::Paused => true,
            SubscriptionStatus::Cancelled => ends_at.is_some_and(|end| end > now),
            SubscriptionStatus::Unpaid | SubscriptionStatus::Expired => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subscription {
    pub organization_id: OrganizationId,
    pub provider_subscription_id: String,
    pub provider_item_id: Option<String>,
    pub provider_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub quantity: i32,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn paid_seats(&self, now: DateTime<Utc>) -> u32 {
        if self.status.grants_seats(self.ends_at, now) {
            self.quantity.max(0) as u32
        } else {
            0
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub status: SubscriptionStatus,
    pub quantity: i32,
    pub renews_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            status: sub.status,
            quantity: sub.quantity,
            renews_at: sub.renews_at,
            ends_at: sub.ends_at,
            last_synced_at: sub.last_synced_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(status: SubscriptionStatus, ends_at: Option<DateTime<Utc>>) -> Subscription {
        let now = Utc::now();
        Subscription {
            organization_id: OrganizationId::new(),
            provider_subscription_id: "sub_1".into(),
            provider_item_id: Some("item_1".into()),
            provider_customer_id: None,
            status,
            quantity: 4,
            renews_at: None,
            ends_at,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn active_like_statuses_grant_their_quantity() {
        let now = Utc::now();
        for status in [
            SubscriptionStatus::OnTrial,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Paused,
        ] {
            assert_eq!(subscription(status, None).paid_seats(now), 4);
        }
    }

    #[test]
    fn cancelled_grants_seats_until_period_end() {
        let now = Utc::now();
        let future = subscription(SubscriptionStatus::Cancelled, Some(now + Duration::days(3)));
        assert_eq!(future.paid_seats(now), 4);
        let past = subscription(SubscriptionStatus::Cancelled, Some(now - Duration::days(1)));
        assert_eq!(past.paid_seats(now), 0);
        let unknown_end = subscription(SubscriptionStatus::Cancelled, None);
        assert_eq!(unknown_end.paid_seats(now), 0);
    }

    #[test]
    fn unpaid_and_expired_grant_nothing() {
        let now = Utc::now();
        assert_eq!(subscription(SubscriptionStatus::Unpaid, None).paid_seats(now), 0);
        assert_eq!(subscription(SubscriptionStatus::Expired, None).paid_seats(now), 0);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SubscriptionStatus::OnTrial,
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Unpaid,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("bogus"), None);
    }
}
