//! Identity record types.
//!
//! Field names and timestamp encoding match the registry files exported by the
//! admin panel: camelCase keys, epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Lifecycle status of an identity record.
///
/// The set is closed. `Contacted` is an operator note and carries no
/// authorization effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum RecordStatus {
    /// Submitted, awaiting operator review
    #[default]
    Pending,
    /// Operator has reached out
    Contacted,
    /// Operator granted an access window
    #[serde(alias = "Paid")]
    Authorized,
    /// Access window has closed
    Expired,
}

impl RecordStatus {
    /// Label used in listings and persisted files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Contacted => "Contacted",
            Self::Authorized => "Authorized",
            Self::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "authorized" | "paid" => Ok(Self::Authorized),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Free-form profile data captured by the lead form.
///
/// Never interpreted by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub budget_range: String,
    pub purpose: String,
    pub contact_method: String,
}

/// One registered identity and its access state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Opaque identifier, assigned at creation
    pub id: String,
    /// Email as submitted; matched through [`crate::identity::normalize_email`]
    pub email: String,
    /// Current persisted status
    #[serde(default)]
    pub status: RecordStatus,
    /// First submission time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[cfg_attr(feature = "typescript", ts(type = "number"))]
    pub created_at: DateTime<Utc>,
    /// Start of the latest access window
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    #[cfg_attr(feature = "typescript", ts(type = "number | null"))]
    pub activated_at: Option<DateTime<Utc>>,
    /// Lead form data
    #[serde(flatten)]
    pub profile: Profile,
}

impl IdentityRecord {
    /// Create a fresh `Pending` record.
    pub fn new(email: impl Into<String>, profile: Profile, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            status: RecordStatus::Pending,
            created_at,
            activated_at: None,
            profile,
        }
    }

    /// Whether the record has ever been granted a window.
    pub fn was_activated(&self) -> bool {
        self.activated_at.is_some()
    }
}

/// Lead form submission, before the registry assigns identity fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Submission {
    /// Submission with only an email.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            profile: Profile::default(),
        }
    }

    /// Attach profile data.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

/// Counts shown on the operator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    pub total: usize,
    pub pending: usize,
    pub authorized: usize,
}
