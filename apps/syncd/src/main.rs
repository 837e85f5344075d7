use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unison_shared_config::SyncSettings;
use unison_syncd::sync::Orchestrator;
use unison_syncd::{config, SyncError};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unison_syncd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "unison-syncd exiting");
        process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), SyncError> {
    let path = config::settings_path();
    let settings = SyncSettings::load(&path)?;

    tracing::info!(
        master = %settings.servers.master.endpoint(),
        slaves = settings.servers.slaves.len(),
        "starting unison-syncd"
    );

    let mut orchestrator = Orchestrator::connect(&settings).await?;
    orchestrator.run().await
}
