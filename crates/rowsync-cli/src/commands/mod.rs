pub mod config;
pub mod device;
pub mod health;
pub mod sessions;

use rowsync_core::{Config, DeviceAddress, DeviceClient, FileHealthStore, SessionSyncEngine};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Engine = SessionSyncEngine<DeviceClient, FileHealthStore>;

/// Global options shared by every command.
pub struct Context {
    pub address: Option<String>,
}

pub fn open_store(config: &Config) -> Result<FileHealthStore, Box<dyn std::error::Error>> {
    Ok(FileHealthStore::open(config.health_store_path()?)?)
}

pub fn device_client(
    config: &Config,
    ctx: &Context,
) -> Result<DeviceClient, Box<dyn std::error::Error>> {
    let address = match &ctx.address {
        Some(raw) => DeviceAddress::parse(raw)?,
        None => config.device_address()?,
    };
    Ok(DeviceClient::new(address, &config.device)?)
}

/// Build the engine from config, pointing it at `--address` when given.
pub fn engine(ctx: &Context) -> Result<(Config, Engine), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let engine = SessionSyncEngine::new(device_client(&config, ctx)?, open_store(&config)?)
        .with_lookback_days(config.health.lookback_days);
    Ok((config, engine))
}

/// `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Pace in seconds per 500 m as `m:ss.t`.
pub fn format_pace(secs_per_500m: f32) -> String {
    if !secs_per_500m.is_finite() || secs_per_500m <= 0.0 {
        return "-".to_string();
    }
    let minutes = (secs_per_500m / 60.0).floor();
    let seconds = secs_per_500m - minutes * 60.0;
    format!("{}:{:04.1}", minutes as u32, seconds)
}
