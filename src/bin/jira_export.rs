use clap::Parser;
use jira_archiver::adapters::jira::build_http_client;
use jira_archiver::core::{ConfigProvider, Storage};
use jira_archiver::utils::error::ErrorSeverity;
use jira_archiver::utils::monitor::SystemMonitor;
use jira_archiver::utils::{logger, validation::Validate};
use jira_archiver::{
    ArchiverError, ExportArgs, ExportOptions, ExportPipeline, ExportRequest, JiraClient,
    LocalStorage, TomlConfig, ZipArchiveWriter,
};

async fn export(
    args: &ExportArgs,
    config: &TomlConfig,
    monitor: &SystemMonitor,
) -> Result<String, ArchiverError> {
    let request = ExportRequest {
        tracker_base_url: args.jira_url.clone(),
        auth_token: args.cookie.clone(),
        query: args.jql.clone(),
    };

    let http = build_http_client(config.request_timeout())?;
    let client = JiraClient::for_request(http, &request, config.max_results());
    let mut pipeline = ExportPipeline::new(client, ExportOptions::from_config(config));

    let issues = pipeline.search(&request).await?;
    monitor.log_stats("Search");

    let sink = ZipArchiveWriter::in_memory(config.compression_level());
    let output = pipeline.write_archive(&issues, sink).await?;
    monitor.log_stats("Archive");

    for page in &output.summary.degraded_pages {
        println!("⚠️  {} exported without comments", page);
    }

    let storage = LocalStorage::new(&args.output_dir);
    let filename = config.archive_filename();
    storage
        .write_file(filename, &output.archive.into_inner())
        .await?;

    Ok(storage.full_path(filename).display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ExportArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting jira-export");

    // 驗證參數與配置
    let config = match args.validate().and_then(|_| args.load_config()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let monitor = SystemMonitor::new(config.monitoring_enabled());
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    match export(&args, &config, &monitor).await {
        Ok(output_path) => {
            monitor.log_final_stats();
            tracing::info!("✅ Export completed successfully!");
            println!("✅ Export completed successfully!");
            println!("📁 Archive saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 依錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
