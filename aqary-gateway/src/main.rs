//! Aqary Gateway - registry administration and property analysis

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aqary_gateway::{Args, Gateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so command output stays pipeable
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("aqary_gateway={log_level},aqary_registry={log_level},aqary_agent={log_level},warn")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(2);
    }

    debug!(registry = %args.registry_path.display(), admin = %args.admin_email, "Configuration loaded");

    let gateway = Gateway::from_args(&args)?;

    // Ctrl-C cancels any in-flight analysis, including backoff waits
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            let _ = shutdown_tx.send(());
        }
    });

    let output = gateway
        .execute(args.user.as_deref(), args.command, Some(shutdown_rx))
        .await?;
    println!("{output}");
    Ok(())
}
