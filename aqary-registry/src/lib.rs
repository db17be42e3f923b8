//! Aqary Registry - identity records and time-boxed access
//!
//! Submitters land in the registry as `Pending`. An operator activates a
//! record, which opens a 24-hour access window with a 5-minute grace period.
//!
//! # Key Components
//!
//! - [`RegistryStore`]: Durable collection with purge-on-load and per-mutation persistence
//! - [`LeasePolicy`]: Pure authorization and countdown over a single record
//! - [`normalize_email`] / [`resolve`]: Email-keyed identity resolution
//! - [`LoginGate`]: Login decision table and session binding
//!
//! # Example
//!
//! ```ignore
//! use aqary_registry::{JsonFileBackend, LoginGate, RegistryStore, Submission};
//!
//! let store = RegistryStore::open(JsonFileBackend::new("registry.json"));
//! let record = store.submit(Submission::email("jane@x.com"))?;
//! store.activate(&record.id)?;
//!
//! let session = LoginGate::default().login(&store.records(), "jane@x.com", chrono::Utc::now())?;
//! ```

pub mod backend;
pub mod clock;
pub mod errors;
pub mod identity;
pub mod lease;
pub mod login;
pub mod payload;
pub mod store;
pub mod types;

pub use backend::{JsonFileBackend, MemoryBackend, RegistryBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{RegistryError, RegistryResult};
pub use identity::{normalize_email, resolve, AdminEmail, EmailKey, NoSuperuser, SuperuserPredicate};
pub use lease::{LeasePolicy, Remaining};
pub use login::{LoginGate, LoginRejection, Session, SessionKind};
pub use payload::{decode_payload, encode_payload};
pub use store::{RegistryStore, StoreConfig};
pub use types::*;
