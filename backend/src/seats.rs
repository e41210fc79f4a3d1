//! Seat arithmetic.
//!
//! An organization occupies one seat per active user, per user pending removal
//! (they keep access until their effective date) and per open invitation.
//! Capacity is the free tier plus the paid quantity on the subscription.
//! Everything here is pure so handlers, the reconcile job and tests share one
//! definition of the numbers.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub const DEFAULT_FREE_SEATS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatPolicy {
    pub free_seats: u32,
}

impl Default for SeatPolicy {
    fn default() -> Self {
        Self {
            free_seats: DEFAULT_FREE_SEATS,
        }
    }
}

impl SeatPolicy {
    pub fn new(free_seats: u32) -> Self {
        Self { free_seats }
    }

    /// Paid seats needed so that `used` fits.
    pub fn required_paid_seats(&self, used: u32) -> u32 {
        used.saturating_sub(self.free_seats)
    }

    /// Paid quantity that covers the usage left once pending removals lapse.
    pub fn billable_quantity(&self, usage: &SeatUsage) -> u32 {
        self.required_paid_seats(usage.used_after_pending_removals())
    }
}

/// Seat occupancy counts as loaded from the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeatUsage {
    pub active_users: u32,
    pub pending_removal_users: u32,
    pub pending_invitations: u32,
}

impl SeatUsage {
    pub fn used(&self) -> u32 {
        self.active_users
            .saturating_add(self.pending_removal_users)
            .saturating_add(self.pending_invitations)
    }

    pub fn used_after_pending_removals(&self) -> u32 {
        self.used().saturating_sub(self.pending_removal_users)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeatTier {
    Free,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SeatSummary {
    pub free_seats: u32,
    pub paid_seats: u32,
    pub total_seats: u32,
    pub used_seats: u32,
    pub available_seats: u32,
    pub active_users: u32,
    pub pending_removal_users: u32,
    pub pending_invitations: u32,
    pub seats_after_pending_removals: u32,
    pub tier: SeatTier,
    pub over_capacity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatError {
    #[error("Not enough seats: requested {requested}, available {available}")]
    NoSeatsAvailable { requested: u32, available: u32 },
    #[error(
        "Cannot reduce to {requested_total} seats while {used} are in use; remove {must_remove} first"
    )]
    DowngradeBelowUsage {
        requested_total: u32,
        used: u32,
        must_remove: u32,
    },
    #[error("{0}")]
    InvalidQuantity(String),
}

impl SeatError {
    pub fn details(&self) -> serde_json::Value {
        match self {
            SeatError::NoSeatsAvailable {
                requested,
                available,
            } => serde_json::json!({ "requested": requested, "available": available }),
            SeatError::DowngradeBelowUsage {
                requested_total,
                used,
                must_remove,
            } => serde_json::json!({
                "requested_total": requested_total,
                "used": used,
                "must_remove": must_remove,
            }),
            SeatError::InvalidQuantity(_) => serde_json::Value::Null,
        }
    }
}

pub fn summarize(policy: SeatPolicy, paid_seats: u32, usage: SeatUsage) -> SeatSummary {
    let total_seats = policy.free_seats.saturating_add(paid_seats);
    let used_seats = usage.used();
    SeatSummary {
        free_seats: policy.free_seats,
        paid_seats,
        total_seats,
        used_seats,
        available_seats: total_seats.saturating_sub(used_seats),
        active_users: usage.active_users,
        pending_removal_users: usage.pending_removal_users,
        pending_invitations: usage.pending_invitations,
        seats_after_pending_removals: usage.used_after_pending_removals(),
        tier: if paid_seats == 0 {
            SeatTier::Free
        } else {
            SeatTier::Paid
        },
        over_capacity: used_seats > total_seats,
    }
}

/// Succeeds when `requested` more seats fit under the current capacity.
pub fn ensure_capacity(summary: &SeatSummary, requested: u32) -> Result<(), SeatError> {
    if summary.used_seats.saturating_add(requested) <= summary.total_seats {
        Ok(())
    } else {
        Err(SeatError::NoSeatsAvailable {
            requested,
            available: summary.available_seats,
        })
    }
}

/// Checks a change of the paid quantity to `new_paid`. Users pending removal
/// are ignored because they are gone by the time a period-end change applies.
pub fn validate_downgrade(
    policy: SeatPolicy,
    usage: SeatUsage,
    new_paid: u32,
) -> Result<(), SeatError> {
    let requested_total = policy.free_seats.saturating_add(new_paid);
    let used = usage.used_after_pending_removals();
    if used <= requested_total {
        return Ok(());
    }
    Err(SeatError::DowngradeBelowUsage {
        requested_total,
        used,
        must_remove: used - requested_total,
    })
}
