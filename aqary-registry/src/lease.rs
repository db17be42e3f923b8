//! Lease state machine.
//!
//! Pure authorization decisions over a single record. Nothing here mutates or
//! persists state; every answer is a function of `(status, activated_at, now)`.
//!
//! ```text
//! Pending ──activate──▶ Authorized ──window + grace elapsed──▶ Expired
//!    │                      ▲                                     │
//! Contacted                 └──────────── re-activate ────────────┘
//! ```
//!
//! There are two bounds. Authorization is cut at
//! `activated_at + window + grace`; the countdown shown to users runs against
//! `activated_at + window`, so the display reads "Expired" up to five minutes
//! before access is actually refused.

use chrono::{DateTime, Duration, Utc};

use crate::types::{IdentityRecord, RecordStatus};

/// Length of an authorized window, in seconds (24h).
pub const AUTHORIZED_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Tolerance past the window before access is cut, in seconds (5min).
pub const GRACE_PERIOD_SECS: i64 = 5 * 60;

/// Window and grace durations applied to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeasePolicy {
    pub window: Duration,
    pub grace: Duration,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self {
            window: Duration::seconds(AUTHORIZED_WINDOW_SECS),
            grace: Duration::seconds(GRACE_PERIOD_SECS),
        }
    }
}

impl LeasePolicy {
    /// Instant at which access is refused.
    pub fn hard_expiry(&self, activated_at: DateTime<Utc>) -> DateTime<Utc> {
        activated_at + self.window + self.grace
    }

    /// Instant at which the displayed countdown reaches zero.
    pub fn display_expiry(&self, activated_at: DateTime<Utc>) -> DateTime<Utc> {
        activated_at + self.window
    }

    /// Whether the record currently grants access.
    ///
    /// An `Authorized` record without an activation stamp never grants access.
    pub fn is_authorized(&self, record: &IdentityRecord, now: DateTime<Utc>) -> bool {
        if record.status != RecordStatus::Authorized {
            return false;
        }
        match record.activated_at {
            Some(activated_at) => now < self.hard_expiry(activated_at),
            None => false,
        }
    }

    /// Whether an `Authorized` record's lease has run out.
    pub fn is_lapsed(&self, record: &IdentityRecord, now: DateTime<Utc>) -> bool {
        record.status == RecordStatus::Authorized
            && record
                .activated_at
                .is_some_and(|activated_at| now >= self.hard_expiry(activated_at))
    }

    /// Status after lazy reconciliation.
    pub fn derived_status(&self, record: &IdentityRecord, now: DateTime<Utc>) -> RecordStatus {
        if self.is_lapsed(record, now) {
            RecordStatus::Expired
        } else {
            record.status
        }
    }

    /// Countdown for display. `None` when the record was never activated.
    pub fn remaining_time(&self, record: &IdentityRecord, now: DateTime<Utc>) -> Option<Remaining> {
        let activated_at = record.activated_at?;
        let left = self.display_expiry(activated_at) - now;
        if left <= Duration::zero() {
            Some(Remaining::Expired)
        } else {
            Some(Remaining::Active(left))
        }
    }
}

/// Displayed time left in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Active(Duration),
    Expired,
}

impl Remaining {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active(left) => write!(f, "{}h {}m", left.num_hours(), left.num_minutes() % 60),
            Self::Expired => f.write_str("Expired"),
        }
    }
}

/// [`LeasePolicy::is_authorized`] under the default policy.
pub fn is_authorized(record: &IdentityRecord, now: DateTime<Utc>) -> bool {
    LeasePolicy::default().is_authorized(record, now)
}

/// [`LeasePolicy::remaining_time`] under the default policy.
pub fn remaining_time(record: &IdentityRecord, now: DateTime<Utc>) -> Option<Remaining> {
    LeasePolicy::default().remaining_time(record, now)
}
