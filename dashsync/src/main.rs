use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dashsync::cli::{Cli, Commands, DashboardCommand, FolderCommand};
use dashsync::config::SyncConfig;
use dashsync::render;
use dashsync::sync::{SyncEngine, SyncReport};
use dashsync_core::{DashboardClient, SearchParams};
use tracing_subscriber::EnvFilter;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &SyncReport) {
    for item in &report.items {
        if let Some(line) = render::outcome_line(item) {
            println!("{line}");
        }
        if let Some(line) = render::failure_line(item) {
            eprintln!("{line}");
        }
    }
    println!("{}", render::summary_line(&report.summary()));
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SyncConfig::load(cli.flag_layer(), cli.config.as_deref())
        .context("failed to load configuration")?;
    let client = DashboardClient::new(&config.url, &config.apikey)
        .with_context(|| format!("failed to create client for {}", config.url))?;

    match cli.command {
        Commands::Download { all, target } => {
            if !all {
                anyhow::bail!("nothing to download; pass --all to download every folder");
            }
            let engine = SyncEngine::new(client, config);
            let report = engine
                .download_all(&target)
                .await
                .with_context(|| format!("download into {} failed", target.display()))?;
            print_report(&report);
            Ok(())
        }
        Commands::Upload { files, overwrite } => {
            let engine = SyncEngine::new(client, config);
            let report = engine
                .upload(&files, overwrite)
                .await
                .with_context(|| format!("upload from {} failed", files.display()))?;
            print_report(&report);
            Ok(())
        }
        Commands::Folder {
            command: FolderCommand::List,
        } => {
            let folders = client.list_folders().await.context("failed to list folders")?;
            if folders.is_empty() {
                println!("No folders found.");
            } else {
                print!("{}", render::folders_table(&folders));
            }
            Ok(())
        }
        Commands::Dashboard { command } => {
            let params = match command {
                DashboardCommand::List => SearchParams::default(),
                DashboardCommand::Search(args) => args.to_params(),
            };
            let hits = client
                .search_dashboards(&params)
                .await
                .context("failed to search dashboards")?;
            if hits.is_empty() {
                println!("No results found.");
            } else {
                print!("{}", render::search_table(&hits));
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[dashsync] error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
