mod prompt;
mod shutdown;

use anyhow::Context;
use azpool_cloud::CloudProvider;
use azpool_cloud_azure::AzureCloudProvider;
use azpool_core::{
    Orchestrator, PoolSpec, ProvisionError, ProvisionReport, ask_pool_parameters, authenticate,
    fill_storage_credentials,
};
use clap::Parser;
use colored::Colorize;
use prompt::TerminalPrompter;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azpool", version)]
#[command(
    about = "Provision an Azure Batch pool and a Linux VM with a public IP",
    long_about = None
)]
struct Cli {
    /// 作成または再利用するVM名（VMの選択をスキップ）
    #[arg(long, env = "AZPOOL_VM")]
    vm: Option<String>,

    /// 設定ファイル（デフォルト: azconfig.json を探索）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 警告とエラーのみログ出力
    #[arg(short, long, conflicts_with = "debug")]
    quiet: bool,

    /// デバッグログを出力
    #[arg(short, long)]
    debug: bool,

    /// Batchプールのスタートタスクのコマンドラインを表示（プロビジョニングはしない）
    #[arg(long)]
    startup_cli: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting azpool");

    let cancel = CancellationToken::new();
    shutdown::spawn_supervisor(cancel.clone());

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ProvisionError>() {
            Some(err) if err.is_cancelled() => {
                tracing::warn!("Cancelled, shutting down");
                ExitCode::from(shutdown::SIGNAL_EXIT_CODE as u8)
            }
            Some(err) => {
                tracing::error!(category = %err.category(), "{}", err);
                ExitCode::FAILURE
            }
            None => {
                tracing::error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, cancel: &CancellationToken) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => azpool_config::find_config_file()?,
    };
    tracing::debug!("Loading configuration from {}", config_path.display());
    let mut config = azpool_config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let provider = AzureCloudProvider::new(config.subscription_id.clone());
    if cli.startup_cli {
        return show_startup_cli(&provider, &config_path, &mut config, cancel).await;
    }

    authenticate(&provider, cancel).await?;

    let mut orchestrator = Orchestrator::new(&provider, &config, TerminalPrompter);
    let report = orchestrator
        .run(cancel, cli.vm.as_deref().unwrap_or(""))
        .await?;

    print_summary(&report);
    Ok(())
}

async fn show_startup_cli(
    provider: &dyn CloudProvider,
    config_path: &std::path::Path,
    config: &mut azpool_config::Config,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    if ask_pool_parameters(&TerminalPrompter, cancel, config).await? {
        azpool_config::save(config_path, config)?;
        tracing::info!("Saved batch pool parameters to {}", config_path.display());
    }
    fill_storage_credentials(provider, cancel, config).await?;

    let pool = config
        .batch
        .as_ref()
        .context("batch pool parameters are missing")?;
    let spec = PoolSpec::from_config(config, &config.resource_group, pool);
    tracing::debug!("Batch pool request: {}", serde_json::to_string_pretty(&spec)?);

    println!("{}", spec.start_task.command_line);
    Ok(())
}

fn print_summary(report: &ProvisionReport) {
    let address = report
        .public_ip
        .ip_address
        .as_deref()
        .unwrap_or("(not assigned)");

    println!();
    println!("{}", "✓ Provisioning complete".green().bold());
    println!(
        "  {:<16} {}",
        "Resource group:",
        report.resource_group.name.cyan()
    );
    println!(
        "  {:<16} {}",
        "Storage account:",
        report.storage_account.name.cyan()
    );
    println!(
        "  {:<16} {}",
        "Batch account:",
        report.batch_account.name.cyan()
    );
    println!(
        "  {:<16} {} ({})",
        "VM:",
        report.vm.name.cyan(),
        report.vm.origin
    );
    println!("  {:<16} {}", "Public address:", address.yellow().bold());
}
