//! Health subcommand: inspect and manage workouts in the local health store.

use clap::Subcommand;
use rowsync_core::{Config, HealthStore};

use super::{engine, open_store, CliResult, Context};

#[derive(Subcommand)]
pub enum HealthAction {
    /// Show store availability and permission state
    Status,
    /// Grant read/write access for all workout record types
    Grant,
    /// Revoke access
    Revoke,
    /// List rowing workouts, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout and its associated records
    Delete {
        /// Workout ID
        id: String,
    },
    /// Delete all rowing workouts
    DeleteAll,
}

pub async fn run(action: HealthAction, ctx: &Context) -> CliResult {
    match action {
        HealthAction::Status => {
            let store = open_store(&Config::load()?)?;
            let availability = store.availability().await;
            println!("{}", availability.message());
            let granted = store.has_permissions().await;
            println!(
                "Permissions: {}",
                if granted { "granted" } else { "not granted" }
            );
            if let Some(path) = store.path() {
                println!("Store: {}", path.display());
            }
        }
        HealthAction::Grant => {
            open_store(&Config::load()?)?.set_permissions(true)?;
            println!("Permissions granted");
        }
        HealthAction::Revoke => {
            open_store(&Config::load()?)?.set_permissions(false)?;
            println!("Permissions revoked");
        }
        HealthAction::List { json } => {
            let (_config, engine) = engine(ctx)?;
            let workouts = engine.load_health_workouts().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&workouts)?);
            } else if workouts.is_empty() {
                println!("No rowing workouts in the health store");
            } else {
                for w in &workouts {
                    println!(
                        "{}  {}  {:>4} min  {}",
                        w.id,
                        w.start
                            .with_timezone(&chrono::Local)
                            .format("%Y-%m-%d %H:%M"),
                        w.duration_minutes(),
                        w.title.as_deref().unwrap_or(w.display_name())
                    );
                }
            }
        }
        HealthAction::Delete { id } => {
            let (_config, engine) = engine(ctx)?;
            engine.delete_health_workout(&id).await?;
            println!("Workout {id} deleted");
        }
        HealthAction::DeleteAll => {
            let (_config, engine) = engine(ctx)?;
            let deleted = engine.delete_all_health_workouts().await?;
            println!("{deleted} workouts deleted");
        }
    }
    Ok(())
}
