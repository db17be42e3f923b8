//! AnalysisClient - main entry point for capability invocation.
//!
//! One client serves every capability. It owns the backend, the retry
//! schedule and cancellation; capabilities only describe their request and
//! how to read the answer.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::{AnalysisBackend, BackendError};
use crate::capability::{
    Capability, CapabilityDescriptor, DocumentAudit, DocumentQuery, ReliabilityQuery,
    ReliabilityReport, ScenarioQuery, SimulationReport, UnitAudit, UnitQuery, ValuationQuery,
    ValuationReport,
};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// What callers see when an invocation does not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Failure that another attempt would not fix
    #[error("{capability} failed on attempt {attempts}: {source}")]
    Fatal {
        capability: Capability,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// Every allowed attempt hit a retryable failure
    #[error("{capability} failed after {attempts} attempts: {source}")]
    Exhausted {
        capability: Capability,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    /// Shutdown requested during an attempt or a backoff wait
    #[error("{capability} cancelled")]
    Cancelled { capability: Capability },
}

impl QueryError {
    /// The backend failure behind this error, if any.
    pub fn last_failure(&self) -> Option<&BackendError> {
        match self {
            Self::Fatal { source, .. } | Self::Exhausted { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    /// Attempts made before giving up.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Fatal { attempts, .. } | Self::Exhausted { attempts, .. } => Some(*attempts),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Configuration for the AnalysisClient.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub retry: RetryPolicy,
}

pub struct AnalysisClient {
    backend: Arc<dyn AnalysisBackend>,
    sleeper: Arc<dyn Sleeper>,
    config: ClientConfig,
}

/// Resolves once shutdown is signalled. Never resolves without a receiver,
/// or after every sender is gone.
async fn shutdown_signal(shutdown: &mut Option<broadcast::Receiver<()>>) {
    if let Some(rx) = shutdown {
        match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => {}
        }
    }
    std::future::pending::<()>().await
}

impl AnalysisClient {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self::with_config(backend, ClientConfig::default())
    }

    pub fn with_config(backend: Arc<dyn AnalysisBackend>, config: ClientConfig) -> Self {
        Self {
            backend,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the source of backoff waits.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one capability to completion.
    pub async fn invoke<Q: CapabilityDescriptor>(&self, query: &Q) -> Result<Q::Report, QueryError> {
        self.invoke_until(query, None).await
    }

    /// Run one capability, aborting when `shutdown` fires.
    ///
    /// Attempts are strictly sequential. A retryable failure waits
    /// `n * backoff_step` before retry `n`; a fatal failure returns at once.
    pub async fn invoke_until<Q: CapabilityDescriptor>(
        &self,
        query: &Q,
        mut shutdown: Option<broadcast::Receiver<()>>,
    ) -> Result<Q::Report, QueryError> {
        let capability = query.capability();
        let request = query.build_request();
        let policy = self.config.retry;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(
                %capability,
                attempt = attempts,
                max_attempts = policy.max_attempts,
                backend = self.backend.id(),
                "Invoking backend"
            );

            let outcome = tokio::select! {
                biased;
                _ = shutdown_signal(&mut shutdown) => {
                    info!(%capability, attempt = attempts, "Invocation cancelled");
                    return Err(QueryError::Cancelled { capability });
                }
                outcome = self.backend.generate(&request) => outcome,
            };

            let error = match outcome {
                Ok(response) => {
                    let report = query.normalize(&response);
                    info!(%capability, attempts, "Invocation completed");
                    return Ok(report);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!(%capability, attempts, error = %error, "Fatal backend failure");
                return Err(QueryError::Fatal {
                    capability,
                    attempts,
                    source: error,
                });
            }

            if !policy.allows_another(attempts) {
                warn!(%capability, attempts, error = %error, "Retries exhausted");
                return Err(QueryError::Exhausted {
                    capability,
                    attempts,
                    source: error,
                });
            }

            let delay = policy.delay_before_retry(attempts);
            warn!(
                %capability,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retryable failure, backing off"
            );

            tokio::select! {
                biased;
                _ = shutdown_signal(&mut shutdown) => {
                    info!(%capability, attempt = attempts, "Invocation cancelled during backoff");
                    return Err(QueryError::Cancelled { capability });
                }
                _ = self.sleeper.sleep(delay) => {}
            }
        }
    }

    pub async fn valuation(&self, query: &ValuationQuery) -> Result<ValuationReport, QueryError> {
        self.invoke(query).await
    }

    pub async fn entity_reliability(
        &self,
        query: &ReliabilityQuery,
    ) -> Result<ReliabilityReport, QueryError> {
        self.invoke(query).await
    }

    pub async fn simulate(&self, query: &ScenarioQuery) -> Result<SimulationReport, QueryError> {
        self.invoke(query).await
    }

    pub async fn audit_document(&self, query: &DocumentQuery) -> Result<DocumentAudit, QueryError> {
        self.invoke(query).await
    }

    pub async fn audit_unit(&self, query: &UnitQuery) -> Result<UnitAudit, QueryError> {
        self.invoke(query).await
    }
}
