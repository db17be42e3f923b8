//! Registry store.
//!
//! Owns the canonical collection of identity records. The collection is held
//! behind a single mutex and the full collection is rewritten after every
//! mutation. Retention purge and lease reconciliation happen only at load.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::backend::RegistryBackend;
use crate::clock::{Clock, SystemClock};
use crate::errors::{RegistryError, RegistryResult};
use crate::identity::{matches_key, normalize_email, resolve};
use crate::lease::LeasePolicy;
use crate::payload::decode_payload;
use crate::types::{IdentityRecord, RecordStatus, RegistrySummary, Submission};

/// Records older than this are dropped at load (7 days).
pub const RETENTION_DAYS: i64 = 7;

/// Store configuration.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Lease window and grace
    pub policy: LeasePolicy,
    /// Age at which records are purged
    pub retention: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            policy: LeasePolicy::default(),
            retention: Duration::days(RETENTION_DAYS),
        }
    }
}

/// Durable collection of identity records.
pub struct RegistryStore<B: RegistryBackend> {
    backend: B,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    records: Mutex<Vec<IdentityRecord>>,
}

impl<B: RegistryBackend> RegistryStore<B> {
    /// Open the store on the wall clock and load the persisted collection.
    pub fn open(backend: B) -> Self {
        Self::open_with(backend, Arc::new(SystemClock), StoreConfig::default())
    }

    /// Open with an explicit clock and configuration.
    pub fn open_with(backend: B, clock: Arc<dyn Clock>, config: StoreConfig) -> Self {
        let store = Self {
            backend,
            clock,
            config,
            records: Mutex::new(Vec::new()),
        };
        store.load();
        store
    }

    /// Lease policy applied by this store.
    pub fn policy(&self) -> LeasePolicy {
        self.config.policy
    }

    /// Clock used for stamps and checks.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Reload from the backend.
    ///
    /// Unreadable or corrupt data yields an empty collection. Records past
    /// retention are dropped and lapsed leases become `Expired`.
    pub fn load(&self) -> Vec<IdentityRecord> {
        let now = self.clock.now();
        let stored = self.read_stored();
        let loaded = stored.len();

        let purge_threshold = now - self.config.retention;
        let policy = self.config.policy;
        let mut expired = 0usize;

        let records: Vec<IdentityRecord> = stored
            .into_iter()
            .filter(|record| record.created_at > purge_threshold)
            .map(|mut record| {
                let status = policy.derived_status(&record, now);
                if status != record.status {
                    expired += 1;
                    record.status = status;
                }
                record
            })
            .collect();

        let purged = loaded - records.len();
        if purged > 0 || expired > 0 {
            info!(loaded, purged, expired, "Registry reconciled at load");
        } else {
            debug!(loaded, "Registry loaded");
        }

        *self.lock() = records.clone();
        records
    }

    /// Write the full collection.
    pub fn save(&self, records: &[IdentityRecord]) -> RegistryResult<()> {
        let bytes = serde_json::to_vec_pretty(records).map_err(RegistryError::Encode)?;
        self.backend.write(&bytes).map_err(RegistryError::Persist)
    }

    /// Snapshot in stored order.
    pub fn records(&self) -> Vec<IdentityRecord> {
        self.lock().clone()
    }

    /// Snapshot ordered by submission time, newest first.
    pub fn records_newest_first(&self) -> Vec<IdentityRecord> {
        let mut records = self.records();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Record by id.
    pub fn get(&self, id: &str) -> Option<IdentityRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    /// Record by claimed email.
    pub fn find_by_email(&self, email: &str) -> Option<IdentityRecord> {
        resolve(&self.lock(), email).cloned()
    }

    /// Register a lead form submission as a fresh `Pending` record.
    ///
    /// Any earlier record under the same email is replaced.
    pub fn submit(&self, submission: Submission) -> RegistryResult<IdentityRecord> {
        let record = IdentityRecord::new(
            submission.email.trim(),
            submission.profile,
            self.clock.now(),
        );
        self.upsert(record.clone())?;
        info!(id = %record.id, "Submission registered");
        Ok(record)
    }

    /// Insert, or replace entirely the record with the same normalized email.
    pub fn upsert(&self, record: IdentityRecord) -> RegistryResult<Vec<IdentityRecord>> {
        self.mutate(|records| {
            upsert_into(records, record);
            records.clone()
        })
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> RegistryResult<bool> {
        let removed = self.mutate(|records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            before != records.len()
        })?;
        if removed {
            info!(id, "Record deleted");
        }
        Ok(removed)
    }

    /// Plain status edit. Granting `Authorized` goes through [`Self::activate`].
    pub fn update_status(
        &self,
        id: &str,
        status: RecordStatus,
    ) -> RegistryResult<Option<IdentityRecord>> {
        if status == RecordStatus::Authorized {
            return Err(RegistryError::ActivationRequired(status));
        }
        self.mutate(|records| {
            records.iter_mut().find(|r| r.id == id).map(|record| {
                record.status = status;
                record.clone()
            })
        })
    }

    /// Grant an access window starting now.
    ///
    /// Calling again restarts the window.
    pub fn activate(&self, id: &str) -> RegistryResult<Option<IdentityRecord>> {
        let now = self.clock.now();
        let activated = self.mutate(|records| {
            records.iter_mut().find(|r| r.id == id).map(|record| {
                record.status = RecordStatus::Authorized;
                record.activated_at = Some(now);
                record.clone()
            })
        })?;
        match &activated {
            Some(record) => info!(id, email = %record.email, "Access window granted"),
            None => warn!(id, "Activation requested for unknown record"),
        }
        Ok(activated)
    }

    /// Pretty JSON of the full collection.
    pub fn export_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(&*self.lock()).map_err(RegistryError::Encode)
    }

    /// Upsert every record of an exported document. Returns the number imported.
    pub fn import_json(&self, document: &str) -> RegistryResult<usize> {
        let incoming: Vec<IdentityRecord> =
            serde_json::from_str(document).map_err(RegistryError::Import)?;
        let count = incoming.len();
        self.mutate(|records| {
            for record in incoming {
                upsert_into(records, record);
            }
        })?;
        info!(count, "Registry document imported");
        Ok(count)
    }

    /// Upsert the record carried by a verification payload.
    pub fn import_payload(&self, payload: &str) -> RegistryResult<IdentityRecord> {
        let record = decode_payload(payload)?;
        let replaced = self.find_by_email(&record.email).is_some();
        self.upsert(record.clone())?;
        info!(id = %record.id, replaced, "Verification payload imported");
        Ok(record)
    }

    /// Dashboard counts.
    pub fn summary(&self) -> RegistrySummary {
        let records = self.lock();
        RegistrySummary {
            total: records.len(),
            pending: records
                .iter()
                .filter(|r| r.status == RecordStatus::Pending)
                .count(),
            authorized: records
                .iter()
                .filter(|r| r.status == RecordStatus::Authorized)
                .count(),
        }
    }

    fn read_stored(&self) -> Vec<IdentityRecord> {
        let bytes = match self.backend.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Registry unreadable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Registry corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Apply a change to a working copy, persist it, then commit.
    fn mutate<T>(&self, change: impl FnOnce(&mut Vec<IdentityRecord>) -> T) -> RegistryResult<T> {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let out = change(&mut working);
        self.save(&working)?;
        *guard = working;
        Ok(out)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<IdentityRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn upsert_into(records: &mut Vec<IdentityRecord>, record: IdentityRecord) {
    let key = normalize_email(&record.email);
    records.retain(|existing| !matches_key(existing, &key));
    records.push(record);
}
