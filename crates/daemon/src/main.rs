// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden`: fleet supervisor for autonomous build agents.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use wd_core::SignalLiveness;
use wd_daemon::{logging, status, supervisor, Config};
use wd_storage::{RegistryStore, SnapshotReader};

#[derive(Parser)]
#[command(name = "warden", version, about = "Fleet supervisor for autonomous build agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Supervise the fleet until interrupted
    Start,
    /// Run a single supervision cycle and exit
    RunOnce,
    /// Show every registered project and its health
    Status,
    /// Mark projects whose agent died as idle
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Start => {
            let _guard = logging::init(Some(&config.log_dir));
            supervisor::start(&config).await
        }
        Command::RunOnce => {
            let _guard = logging::init(None);
            let report = supervisor::run_once(&config).await?;
            println!(
                "checked {} project(s), {} stalled, {} action(s)",
                report.checked,
                report.stalled,
                report.actions.len()
            );
            for action in &report.actions {
                println!("  {}: {} ({})", action.project, action.kind, action.outcome);
            }
            Ok(())
        }
        Command::Status => {
            let registry = RegistryStore::new(&config.registry_path).read();
            let rows = status::project_health(
                &registry,
                &SignalLiveness,
                &SnapshotReader::new(&config.snapshot_file),
                Utc::now(),
                config.engine.stale_threshold,
            );
            print!("{}", status::render(&rows));
            Ok(())
        }
        Command::Prune => {
            let _guard = logging::init(None);
            let pruned = RegistryStore::new(&config.registry_path).prune_dead(&SignalLiveness, Utc::now())?;
            if pruned.is_empty() {
                println!("No dead agents");
            } else {
                println!("Pruned {}: {}", pruned.len(), pruned.join(", "));
            }
            Ok(())
        }
    }
}
