//! Gateway commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Register interest (lead form). Replaces any earlier submission for the email
    Submit(SubmitArgs),

    /// Check whether an email may sign in, and for how long
    Login {
        /// Claimed email
        email: String,
    },

    /// Registry administration (superuser only)
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Run an analysis (requires a live session)
    #[command(subcommand)]
    Analyze(AnalyzeCommands),
}

impl Commands {
    /// Whether the command reaches the analysis service.
    pub fn needs_analysis(&self) -> bool {
        matches!(self, Self::Analyze(_))
    }
}

/// Lead form fields
#[derive(Debug, Clone, Default, Args)]
pub struct SubmitArgs {
    /// Contact email, the identity key
    pub email: String,

    #[arg(long, default_value = "")]
    pub full_name: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub city: String,

    /// Apartment, Villa, Investment, Office, Shop, Medical Office
    #[arg(long, default_value = "")]
    pub property_type: String,

    #[arg(long, default_value = "")]
    pub budget_range: String,

    /// Living or Investment
    #[arg(long, default_value = "")]
    pub purpose: String,

    /// Phone or WhatsApp
    #[arg(long, default_value = "")]
    pub contact_method: String,
}

/// Operator commands
#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommands {
    /// List records, newest first
    List,

    /// Show record counts
    Summary,

    /// Grant a 24-hour access window, restarting any current one
    Activate {
        /// Record id
        id: String,
    },

    /// Set a record's status (pending, contacted, expired)
    Status {
        /// Record id
        id: String,
        /// New status
        status: String,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },

    /// Write the registry as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Merge records from an exported JSON file
    Import {
        /// Input file
        path: PathBuf,
    },

    /// Merge one record from a base64 verification payload
    ImportPayload {
        /// Payload text
        payload: String,
    },
}

/// Analysis commands
#[derive(Debug, Clone, Subcommand)]
pub enum AnalyzeCommands {
    /// Estimate fair market value
    Valuation {
        /// Area or compound
        #[arg(short, long)]
        location: String,
        /// Apartment, villa, ...
        #[arg(short, long)]
        unit_type: String,
        /// Area in square meters
        #[arg(short, long)]
        area: f64,
        /// Delivery horizon, e.g. Ready or 2027
        #[arg(short, long, default_value = "Ready")]
        delivery: String,
    },

    /// Audit a developer's track record
    Reliability {
        /// Developer name
        entity: String,
    },

    /// Simulate an investment scenario
    Simulate {
        /// Scenario description
        scenario: String,
        /// Budget in EGP
        #[arg(short, long)]
        budget: f64,
        /// Investment horizon
        #[arg(long, default_value = "5 years")]
        horizon: String,
    },

    /// Audit a contract image
    Document {
        /// Image file
        path: PathBuf,
        /// Media type (guessed from the extension when omitted)
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// Audit a unit listing
    Unit {
        /// Listing text
        description: String,
    },
}
