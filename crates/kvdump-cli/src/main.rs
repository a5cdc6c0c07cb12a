use clap::Parser;
use kvdump_core::export_all;
use kvdump_vault::VaultClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod config;


use crate::cli_args::Cli;
use crate::config::resolve_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let settings = resolve_settings(cli)?;
    let http = reqwest::Client::builder()
        .danger_accept_invalid_certs(settings.insecure)
        .build()?;
    let store = VaultClient::new(http, &settings.addr, settings.token)
        .with_namespace(settings.namespace.as_deref());

    info!(
        addr = %store.addr(),
        out = %settings.destination.display(),
        "starting export"
    );
    let stats = export_all(&store, &settings.destination, &settings.options).await?;
    println!(
        "exported {} secrets ({} unchanged, {} skipped) from {} namespaces to {}",
        stats.written,
        stats.unchanged,
        stats.skipped,
        stats.namespaces,
        settings.destination.display()
    );
    Ok(())
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
