//! Device subcommand: status and workout control.

use clap::Subcommand;
use rowsync_core::{Config, RemoteSessionSource};

use super::{device_client, format_duration, format_pace, CliResult, Context};

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Show device status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show live metrics of the running workout
    Live,
    /// Show the current heart rate reading
    Hr,
    /// Start a workout
    Start,
    /// Stop the running workout
    Stop,
}

pub async fn run(action: DeviceAction, ctx: &Context) -> CliResult {
    let config = Config::load()?;
    let client = device_client(&config, ctx)?;

    match action {
        DeviceAction::Status { json } => {
            let status = client.status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            println!("Device:    {}", client.address());
            println!("Online:    {}", status.online);
            println!("Workout:   {}", if status.workout_in_progress { "in progress" } else { "idle" });
            println!("Sessions:  {}", status.session_count);
            println!("Uptime:    {}", format_duration(status.uptime));
            println!("Free heap: {} bytes", status.free_heap);
            if status.ble_connected {
                println!("Heart rate monitor connected ({} bpm)", status.current_heart_rate);
            }
        }
        DeviceAction::Live => {
            let live = client.live().await?;
            println!("Session {}  [{}]", live.session_id, live.phase);
            println!(
                "{:.0} m  {} strokes  {}  {:.0} W  {}/500m  {:.0} spm  {} bpm",
                live.distance,
                live.strokes,
                format_duration(live.duration),
                live.power,
                format_pace(live.pace),
                live.stroke_rate,
                live.heart_rate
            );
        }
        DeviceAction::Hr => {
            println!("{} bpm", client.heart_rate().await?);
        }
        DeviceAction::Start => {
            let response = client.start_workout().await?;
            match response.session_id {
                Some(id) => println!("Workout {} (session {id})", response.status),
                None => println!("Workout {}", response.status),
            }
        }
        DeviceAction::Stop => {
            let response = client.stop_workout().await?;
            println!("Workout {}", response.status);
            if let (Some(distance), Some(strokes)) = (response.distance, response.strokes) {
                println!("{distance:.0} m in {strokes} strokes");
            }
        }
    }
    Ok(())
}
