//! Command execution against the registry and the analysis client.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use aqary_agent::{
    AnalysisClient, DocumentQuery, GeminiBackend, QueryError, ReliabilityQuery, Report,
    ScenarioQuery, UnitQuery, ValuationQuery,
};
use aqary_registry::{
    encode_payload, AdminEmail, Clock, JsonFileBackend, LoginGate, Profile, RecordStatus,
    RegistryBackend, RegistryStore, Session, Submission,
};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cli::{AdminCommands, AnalyzeCommands, Commands, SubmitArgs};
use crate::config::Args;

/// Registry, login gate and optional analysis client behind one command surface.
pub struct Gateway<B: RegistryBackend> {
    store: RegistryStore<B>,
    gate: LoginGate<AdminEmail>,
    analysis: Option<AnalysisClient>,
}

impl Gateway<JsonFileBackend> {
    /// Wire the gateway from parsed arguments.
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let store = RegistryStore::open(JsonFileBackend::new(&args.registry_path));
        let gate = LoginGate::new(AdminEmail::new(&args.admin_email)).with_policy(store.policy());

        let analysis = match &args.gemini.gemini_api_key {
            Some(key) => {
                let backend = GeminiBackend::with_base_url(&args.gemini.gemini_base_url, key)
                    .context("Failed to build Gemini backend")?
                    .with_models(&args.gemini.fast_model, &args.gemini.deep_model);
                Some(AnalysisClient::with_config(Arc::new(backend), args.client_config()))
            }
            None => None,
        };

        Ok(Self::new(store, gate, analysis))
    }
}

impl<B: RegistryBackend> Gateway<B> {
    pub fn new(
        store: RegistryStore<B>,
        gate: LoginGate<AdminEmail>,
        analysis: Option<AnalysisClient>,
    ) -> Self {
        Self {
            store,
            gate,
            analysis,
        }
    }

    pub fn store(&self) -> &RegistryStore<B> {
        &self.store
    }

    /// Bind a session for `claimed`, or explain the refusal by message key.
    pub fn login(&self, claimed: &str) -> anyhow::Result<Session> {
        self.gate
            .login(&self.store.records(), claimed, self.store.clock().now())
            .map_err(|rejection| anyhow!("{} ({})", rejection, rejection.message_key()))
    }

    fn session_for(&self, user: Option<&str>) -> anyhow::Result<Session> {
        let user = user.ok_or_else(|| anyhow!("This command needs --as <email>"))?;
        self.login(user)
    }

    fn check(&self, session: &Session) -> anyhow::Result<()> {
        session
            .check(self.store.clock().now())
            .map_err(|rejection| anyhow!("{} ({})", rejection, rejection.message_key()))
    }

    /// Execute a command and render its output.
    pub async fn execute(
        &self,
        user: Option<&str>,
        command: Commands,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> anyhow::Result<String> {
        match command {
            Commands::Submit(form) => self.submit(form),
            Commands::Login { email } => {
                let session = self.login(&email)?;
                let remaining = session
                    .remaining(self.store.clock().now())
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unlimited".to_string());
                Ok(format!(
                    "Signed in as {} ({:?}), remaining: {}",
                    session.record().email,
                    session.kind(),
                    remaining
                ))
            }
            Commands::Admin(admin) => {
                let session = self.session_for(user)?;
                if !session.is_superuser() {
                    bail!("Admin commands require the superuser identity");
                }
                self.admin(admin).await
            }
            Commands::Analyze(analysis) => {
                let session = self.session_for(user)?;
                self.analyze(&session, analysis, shutdown).await
            }
        }
    }

    fn submit(&self, form: SubmitArgs) -> anyhow::Result<String> {
        if !form.email.contains('@') {
            bail!("Not an email address: {}", form.email);
        }
        let submission = Submission::email(form.email).with_profile(Profile {
            full_name: form.full_name,
            phone: form.phone,
            city: form.city,
            property_type: form.property_type,
            budget_range: form.budget_range,
            purpose: form.purpose,
            contact_method: form.contact_method,
        });
        let record = self.store.submit(submission)?;
        let payload = encode_payload(&record)?;
        Ok(format!(
            "Request {} received, pending approval.\nVerification payload:\n{}",
            record.id, payload
        ))
    }

    async fn admin(&self, command: AdminCommands) -> anyhow::Result<String> {
        match command {
            AdminCommands::List => {
                let now = self.store.clock().now();
                let policy = self.store.policy();
                let lines: Vec<String> = self
                    .store
                    .records_newest_first()
                    .iter()
                    .map(|r| {
                        let remaining = policy
                            .remaining_time(r, now)
                            .map(|rem| rem.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        format!(
                            "{}\t{}\t{}\t{}\t{}",
                            r.id, r.email, r.status, r.profile.full_name, remaining
                        )
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            AdminCommands::Summary => {
                let summary = self.store.summary();
                Ok(serde_json::to_string_pretty(&summary)?)
            }
            AdminCommands::Activate { id } => match self.store.activate(&id)? {
                Some(record) => Ok(format!("Activated {} ({})", record.id, record.email)),
                None => bail!("No record with id {id}"),
            },
            AdminCommands::Status { id, status } => {
                let status: RecordStatus = status.parse().map_err(|e: String| anyhow!(e))?;
                match self.store.update_status(&id, status)? {
                    Some(record) => Ok(format!("{} is now {}", record.id, record.status)),
                    None => bail!("No record with id {id}"),
                }
            }
            AdminCommands::Delete { id } => {
                if self.store.delete(&id)? {
                    Ok(format!("Deleted {id}"))
                } else {
                    Ok(format!("No record with id {id}, nothing deleted"))
                }
            }
            AdminCommands::Export { out } => {
                let document = self.store.export_json()?;
                match out {
                    Some(path) => {
                        tokio::fs::write(&path, &document)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        Ok(format!("Exported registry to {}", path.display()))
                    }
                    None => Ok(document),
                }
            }
            AdminCommands::Import { path } => {
                let document = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let count = self.store.import_json(&document)?;
                Ok(format!("Imported {count} record(s)"))
            }
            AdminCommands::ImportPayload { payload } => {
                let record = self.store.import_payload(&payload)?;
                Ok(format!("Imported {} ({})", record.id, record.email))
            }
        }
    }

    async fn analyze(
        &self,
        session: &Session,
        command: AnalyzeCommands,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> anyhow::Result<String> {
        let client = self
            .analysis
            .as_ref()
            .ok_or_else(|| anyhow!("Analysis is not configured (GEMINI_API_KEY)"))?;
        self.check(session)?;

        let output = match command {
            AnalyzeCommands::Valuation {
                location,
                unit_type,
                area,
                delivery,
            } => {
                let query = ValuationQuery::new(location, unit_type, area, delivery);
                render(client.invoke_until(&query, shutdown).await)?
            }
            AnalyzeCommands::Reliability { entity } => {
                render(client.invoke_until(&ReliabilityQuery::new(entity), shutdown).await)?
            }
            AnalyzeCommands::Simulate {
                scenario,
                budget,
                horizon,
            } => {
                let query = ScenarioQuery::new(scenario, budget, horizon);
                render(client.invoke_until(&query, shutdown).await)?
            }
            AnalyzeCommands::Document { path, mime_type } => {
                let mime_type = match mime_type {
                    Some(m) => m,
                    None => guess_mime_type(&path)?.to_string(),
                };
                let image = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let query = DocumentQuery::new(mime_type, image);
                render(client.invoke_until(&query, shutdown).await)?
            }
            AnalyzeCommands::Unit { description } => {
                render(client.invoke_until(&UnitQuery::new(description), shutdown).await)?
            }
        };

        // The lease may have lapsed while retries were backing off.
        self.check(session)?;
        Ok(output)
    }
}

fn render<R>(result: Result<R, QueryError>) -> anyhow::Result<String>
where
    R: Report + serde::Serialize,
{
    let report = result?;
    if report.is_low_confidence() {
        warn!(
            defaulted = report.defaulted_fields().len(),
            "Report is partly defaulted"
        );
    } else {
        info!("Report complete");
    }
    let mut value = serde_json::to_value(&report)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("lowConfidence".to_string(), json!(report.is_low_confidence()));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn guess_mime_type(path: &Path) -> anyhow::Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "heic" => Ok("image/heic"),
        "pdf" => Ok("application/pdf"),
        _ => bail!(
            "Cannot tell the media type of {}; pass --mime-type",
            path.display()
        ),
    }
}
