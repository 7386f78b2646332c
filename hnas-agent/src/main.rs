//! HNAS hooks - Main entry point
//!
//! `hnas-hooks pre` runs before a backup job and `hnas-hooks post` after it.
//! Configuration comes from the environment the backup tool provides.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use hnas_agent::config::{Config, PostConfig, PreConfig};
use hnas_agent::executor::{run_post_backup, run_pre_backup};
use hnas_agent::naming::format_timestamp;
use hnas_agent::{utils, HnasClient};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); overrides LOG_LEVEL
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Manifest file location; overrides VEEAM_SNAPSHOT_INFO
    #[arg(short, long, global = true, value_name = "FILE")]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    phase: Phase,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Phase {
    /// Create snapshots (and SMB shares) before the backup job
    Pre,
    /// Clean up snapshots after the backup job and apply retention
    Post,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.phase {
        Phase::Pre => pre_backup(&args).await,
        Phase::Post => post_backup(&args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Apply CLI overrides, start logging and make sure the array answers.
async fn connect(common: &mut Config, args: &Args, phase: &str) -> Result<HnasClient> {
    if let Some(level) = &args.log_level {
        common.log_level = level.clone();
    }
    if let Some(path) = &args.manifest {
        common.manifest_path = path.clone();
    }

    utils::logger::init(&common.log_level, &common.log_dir, phase)?;
    tracing::info!(
        "Starting hnas-hooks v{} ({} phase) against {}",
        env!("CARGO_PKG_VERSION"),
        phase,
        common.host
    );

    let client = HnasClient::new(common)?;
    client
        .check_connection()
        .await
        .context("Failed to connect to HNAS. Check credentials and network connectivity")?;
    Ok(client)
}

async fn pre_backup(args: &Args) -> Result<ExitCode> {
    let mut config = PreConfig::from_env().context("Missing required configuration")?;
    let client = connect(&mut config.common, args, "pre").await?;

    let run_timestamp = format_timestamp(&Local::now());
    let report = run_pre_backup(&client, &config, &run_timestamp)
        .await
        .context("Failed to write snapshot manifest")?;

    if report.is_failure() {
        println!(
            "WARNING: No snapshots were created successfully ({} filesystems requested).",
            report.requested
        );
        return Ok(ExitCode::FAILURE);
    }

    println!(
        "SUCCESS: Created {} snapshots and {} SMB shares for Veeam backup.",
        report.snapshots_created(),
        report.shares_created()
    );
    Ok(ExitCode::SUCCESS)
}

async fn post_backup(args: &Args) -> Result<ExitCode> {
    let mut config = PostConfig::from_env().context("Missing required configuration")?;
    let client = connect(&mut config.common, args, "post").await?;

    let report = run_post_backup(&client, &config, Local::now()).await;

    if report.cleanup_performed {
        println!(
            "SUCCESS: Cleaned up {} snapshots and {} SMB shares from current backup session \
             ({} old snapshots and {} old SMB shares removed by retention).",
            report.snapshots_deleted,
            report.shares_deleted,
            report.swept_snapshots,
            report.swept_shares
        );
        if report.share_delete_failures > 0 {
            tracing::warn!(
                "{} SMB shares from this session could not be deleted",
                report.share_delete_failures
            );
        }
    } else {
        println!(
            "SUCCESS: Post-backup processing completed. Snapshots and SMB shares retained based on configuration \
             ({} old snapshots and {} old SMB shares removed by retention).",
            report.swept_snapshots, report.swept_shares
        );
    }
    Ok(ExitCode::SUCCESS)
}
