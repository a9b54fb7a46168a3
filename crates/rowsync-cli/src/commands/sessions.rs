//! Sessions subcommand: list, sync and delete sessions stored on the rower.

use clap::Subcommand;
use rowsync_core::sync::BulkReport;
use rowsync_core::{SessionSummary, SyncOutcome};

use super::{engine, format_duration, format_pace, CliResult, Context};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List sessions on the device
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy one session into the health store
    Sync {
        /// Session ID
        id: u32,
    },
    /// Copy every unsynced session into the health store
    SyncAll {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a synced session from the device
    Delete {
        /// Session ID
        id: u32,
    },
    /// Delete every synced session from the device
    DeleteSynced {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: SessionsAction, ctx: &Context) -> CliResult {
    let (_config, engine) = engine(ctx)?;

    match action {
        SessionsAction::List { json } => {
            let sessions = engine.refresh_sessions().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else {
                print_sessions(&sessions);
            }
        }
        SessionsAction::Sync { id } => {
            engine.check_health().await?;
            match engine.sync_one(id).await {
                SyncOutcome::Synced => println!("Session {id} synced"),
                SyncOutcome::SyncedWithWarning(warning) => {
                    println!("Session {id} synced");
                    eprintln!("warning: {warning}");
                }
                SyncOutcome::Failed(error) => return Err(error.into()),
            }
        }
        SessionsAction::SyncAll { json } => {
            engine.check_health().await?;
            engine.refresh_sessions().await?;
            let report = engine.sync_all().await;
            print_report(&report, json)?;
            if report.failed > 0 || !report.errors.is_empty() {
                return Err(report_error(&report));
            }
        }
        SessionsAction::Delete { id } => {
            engine.refresh_sessions().await?;
            engine.delete_remote_session(id).await?;
            println!("Session {id} deleted from device");
        }
        SessionsAction::DeleteSynced { json } => {
            engine.refresh_sessions().await?;
            let mut report = engine.delete_all_synced_remote().await;
            if report.message.is_none() {
                report.message = Some(format!("{} deleted", report.succeeded));
            }
            print_report(&report, json)?;
            if report.failed > 0 {
                return Err(report_error(&report));
            }
        }
    }
    Ok(())
}

fn report_error(report: &BulkReport) -> Box<dyn std::error::Error> {
    report
        .message
        .clone()
        .unwrap_or_else(|| format!("{} operations failed", report.failed))
        .into()
}

fn print_report(report: &BulkReport, json: bool) -> CliResult {
    if json {
        let value = serde_json::json!({
            "attempted": report.attempted,
            "succeeded": report.succeeded,
            "failed": report.failed,
            "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "errors": report.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "message": report.message,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &report.errors {
        eprintln!("  {error}");
    }
    if let Some(message) = &report.message {
        println!("{message}");
    }
    Ok(())
}

fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No sessions on device");
        return;
    }

    println!(
        "{:>4}  {:<16}  {:>8}  {:>8}  {:>7}  {:>8}  {:>4}  SYNCED",
        "ID", "START", "DURATION", "DISTANCE", "STROKES", "PACE", "HR"
    );
    for s in sessions {
        let start = s
            .started_at()
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<16}  {:>8}  {:>7.0}m  {:>7}  {:>8}  {:>4}  {}",
            s.id,
            start,
            format_duration(u64::from(s.duration)),
            s.distance,
            s.strokes,
            format_pace(s.avg_pace),
            s.avg_heart_rate_bpm(),
            if s.synced { "yes" } else { "no" }
        );
    }
}
