//! Aqary Gateway - command surface over the registry and the analysis client
//!
//! Lead submission, login, registry administration for the superuser, and
//! session-gated property analyses.

pub mod app;
pub mod cli;
pub mod config;

pub use app::Gateway;
pub use cli::{AdminCommands, AnalyzeCommands, Commands, SubmitArgs};
pub use config::{Args, GeminiArgs};
