//! Login gate and session binding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::identity::{normalize_email, resolve, superuser_record, AdminEmail, SuperuserPredicate};
use crate::lease::{LeasePolicy, Remaining};
use crate::types::{IdentityRecord, RecordStatus};

/// Why a claimed identity was turned away.
///
/// Rejections are ordinary outcomes, carried as localizable message keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum LoginRejection {
    #[error("Email not registered")]
    NotRegistered,
    #[error("Request pending approval")]
    PendingApproval,
    #[error("Access window has expired")]
    WindowExpired,
}

impl LoginRejection {
    /// Translation key for the rejection message.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotRegistered => "login.not_registered",
            Self::PendingApproval => "login.pending_approval",
            Self::WindowExpired => "login.window_expired",
        }
    }
}

/// How a session was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Privileged identity, outside the registry
    Superuser,
    /// Registry record with a live lease
    Lease,
}

/// A bound session.
#[derive(Debug, Clone)]
pub struct Session {
    record: IdentityRecord,
    kind: SessionKind,
    bound_at: DateTime<Utc>,
    policy: LeasePolicy,
}

impl Session {
    pub fn record(&self) -> &IdentityRecord {
        &self.record
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn bound_at(&self) -> DateTime<Utc> {
        self.bound_at
    }

    pub fn is_superuser(&self) -> bool {
        self.kind == SessionKind::Superuser
    }

    /// Re-evaluate access. Superuser sessions never lapse.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), LoginRejection> {
        match self.kind {
            SessionKind::Superuser => Ok(()),
            SessionKind::Lease if self.policy.is_authorized(&self.record, now) => Ok(()),
            SessionKind::Lease => Err(LoginRejection::WindowExpired),
        }
    }

    /// Countdown for the navigation bar. Superusers have none.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Remaining> {
        match self.kind {
            SessionKind::Superuser => None,
            SessionKind::Lease => self.policy.remaining_time(&self.record, now),
        }
    }
}

/// Applies the login decision table.
pub struct LoginGate<P: SuperuserPredicate = AdminEmail> {
    superuser: P,
    policy: LeasePolicy,
}

impl Default for LoginGate<AdminEmail> {
    fn default() -> Self {
        Self::new(AdminEmail::default())
    }
}

impl<P: SuperuserPredicate> LoginGate<P> {
    pub fn new(superuser: P) -> Self {
        Self {
            superuser,
            policy: LeasePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LeasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a claimed email against `records` and bind a session.
    pub fn login(
        &self,
        records: &[IdentityRecord],
        claimed: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, LoginRejection> {
        let key = normalize_email(claimed);

        if self.superuser.is_superuser(&key) {
            info!("Superuser session bound");
            return Ok(Session {
                record: superuser_record(&key, now),
                kind: SessionKind::Superuser,
                bound_at: now,
                policy: self.policy,
            });
        }

        let record = resolve(records, key.as_str()).ok_or(LoginRejection::NotRegistered)?;
        let outcome = self.decide(record, now);
        match &outcome {
            Ok(()) => info!(id = %record.id, "Lease session bound"),
            Err(reason) => debug!(id = %record.id, reason = reason.message_key(), "Login rejected"),
        }
        outcome.map(|()| Session {
            record: record.clone(),
            kind: SessionKind::Lease,
            bound_at: now,
            policy: self.policy,
        })
    }

    fn decide(&self, record: &IdentityRecord, now: DateTime<Utc>) -> Result<(), LoginRejection> {
        match record.status {
            RecordStatus::Pending | RecordStatus::Contacted => Err(LoginRejection::PendingApproval),
            RecordStatus::Expired => Err(LoginRejection::WindowExpired),
            RecordStatus::Authorized if !record.was_activated() => {
                Err(LoginRejection::PendingApproval)
            }
            RecordStatus::Authorized if self.policy.is_authorized(record, now) => Ok(()),
            RecordStatus::Authorized => Err(LoginRejection::WindowExpired),
        }
    }
}
