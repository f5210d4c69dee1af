//! peerlend daemon — entry point for running the lending ledger service.

use clap::Parser;
use peerlend_ledger::MemoryBank;
use peerlend_node::{init_logging, LendingService, LogFormat, ServiceConfig, SystemClock};
use peerlend_rpc::RpcServer;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "peerlend-daemon", about = "peerlend lending ledger daemon")]
struct Cli {
    /// Address the RPC server binds to.
    #[arg(long, env = "PEERLEND_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// RPC server port.
    #[arg(long, env = "PEERLEND_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the dev faucet endpoint.
    #[arg(long, env = "PEERLEND_ENABLE_FAUCET")]
    faucet: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "PEERLEND_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "PEERLEND_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<ServiceConfig> = if let Some(ref config_path) = cli.config {
        match ServiceConfig::from_toml_file(&config_path.display().to_string()) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!("failed to load config {}: {e}, using defaults", config_path.display());
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = ServiceConfig {
        listen_addr: cli.listen_addr.unwrap_or(base.listen_addr),
        rpc_port: cli.rpc_port.unwrap_or(base.rpc_port),
        log_format: cli.log_format.unwrap_or(base.log_format),
        log_level: cli.log_level,
        enable_faucet: cli.faucet || base.enable_faucet,
        dev_accounts: base.dev_accounts,
    };

    init_logging(LogFormat::from_config(&config.log_format), &config.log_level);

    let mut bank = MemoryBank::new();
    for seed in &config.dev_accounts {
        bank.deposit(seed.account_id(), seed.amount());
        tracing::info!(account = %seed.account, balance = seed.balance, "seeded dev account");
    }

    let service = Arc::new(LendingService::new(
        bank,
        Box::new(SystemClock),
        config.enable_faucet,
    ));

    tracing::info!(
        "starting peerlend service on {}:{} (faucet: {})",
        config.listen_addr,
        config.rpc_port,
        if config.enable_faucet { "on" } else { "off" },
    );

    let server = RpcServer::new(config.listen_addr.clone(), config.rpc_port);
    server
        .start(service, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received — stopping service");
        })
        .await?;

    tracing::info!("peerlend daemon exited cleanly");
    Ok(())
}
