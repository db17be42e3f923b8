//! Identity resolution.
//!
//! Emails are matched by a normalized key. A configurable superuser predicate
//! short-circuits the registry and yields a synthetic authorized record.

use chrono::{DateTime, Utc};

use crate::types::{IdentityRecord, Profile, RecordStatus};

/// Built-in administrative identity.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@aqarytrust.com";

/// Id carried by the synthetic superuser record.
pub const SUPERUSER_RECORD_ID: &str = "admin";

/// Normalized email: trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailKey(String);

impl EmailKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an email into its registry key.
pub fn normalize_email(email: &str) -> EmailKey {
    EmailKey(email.trim().to_lowercase())
}

/// Whether a record is stored under `key`.
pub fn matches_key(record: &IdentityRecord, key: &EmailKey) -> bool {
    normalize_email(&record.email) == *key
}

/// Find the record for a claimed email.
pub fn resolve<'a>(records: &'a [IdentityRecord], claimed: &str) -> Option<&'a IdentityRecord> {
    let key = normalize_email(claimed);
    records.iter().find(|record| matches_key(record, &key))
}

/// Decides whether a claimed identity bypasses the registry.
pub trait SuperuserPredicate: Send + Sync {
    fn is_superuser(&self, key: &EmailKey) -> bool;
}

/// Superuser identified by a single email.
#[derive(Debug, Clone)]
pub struct AdminEmail(EmailKey);

impl AdminEmail {
    pub fn new(email: &str) -> Self {
        Self(normalize_email(email))
    }

    pub fn key(&self) -> &EmailKey {
        &self.0
    }
}

impl Default for AdminEmail {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_EMAIL)
    }
}

impl SuperuserPredicate for AdminEmail {
    fn is_superuser(&self, key: &EmailKey) -> bool {
        self.0 == *key
    }
}

/// Predicate that never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuperuser;

impl SuperuserPredicate for NoSuperuser {
    fn is_superuser(&self, _key: &EmailKey) -> bool {
        false
    }
}

impl<F> SuperuserPredicate for F
where
    F: Fn(&EmailKey) -> bool + Send + Sync,
{
    fn is_superuser(&self, key: &EmailKey) -> bool {
        self(key)
    }
}

/// Build the synthetic record for a superuser session.
///
/// The record is never stored, so purge and expiry never see it.
pub fn superuser_record(key: &EmailKey, now: DateTime<Utc>) -> IdentityRecord {
    IdentityRecord {
        id: SUPERUSER_RECORD_ID.to_string(),
        email: key.as_str().to_string(),
        status: RecordStatus::Authorized,
        created_at: now,
        activated_at: Some(now),
        profile: Profile {
            full_name: "System Authority".to_string(),
            city: "Registry HQ".to_string(),
            ..Default::default()
        },
    }
}
