use std::env;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use waypost_gateway::collector::collect_profile;
use waypost_gateway::config::GatewayConfig;
use waypost_gateway::cookies::SharedCookieJar;
use waypost_gateway::loader::ContentLoader;
use waypost_gateway::store::SessionStore;
use waypost_gateway::version::VersionInfo;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("waypost_gateway=info".parse()?),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let version_info = VersionInfo::current();
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("{version_info}");
        return Ok(());
    }

    let config = GatewayConfig::load_from_env();
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Waypost gateway {} starting", version_info.full_version());
    info!("  Target URL: {}", config.target_url);
    info!("  State dir: {}", config.state_dir.display());
    info!("  Watchdog deadline: {}s", config.watchdog_secs);

    // One-shot profile snapshot, handed off to the reporting side.
    let profile = collect_profile();
    match serde_json::to_string(&profile) {
        Ok(report) => info!(%report, "device profile collected"),
        Err(e) => error!("Failed to serialize device profile: {}", e),
    }

    let store = SessionStore::new(config.state_dir.clone());
    let jar = Arc::new(SharedCookieJar::new());
    let mut loader = ContentLoader::new(&config, store, jar)?;

    let state = loader.navigate().await?;
    info!(?state, url = %loader.effective_url(), "navigation finished");

    Ok(())
}
