use clap::Parser;
use jira_archiver::utils::logger;
use jira_archiver::{server, AppState, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_logger(&config.monitoring.log_format, args.verbose);
    tracing::info!("Starting jira-archiver");
    if args.verbose {
        tracing::debug!("Server config: {:?}", config);
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let state = AppState::new(&config, monitor_enabled)?;
    server::serve(&config.bind_address(), state).await?;

    Ok(())
}
