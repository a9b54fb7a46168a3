use clap::{Parser, Subcommand};
use rowsync_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "rowsync", version, about = "Copy rowing sessions into your health store")]
struct Cli {
    /// Device address for this invocation (overrides device.address)
    #[arg(long, global = true)]
    address: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sessions stored on the rower
    Sessions {
        #[command(subcommand)]
        action: commands::sessions::SessionsAction,
    },
    /// Workouts in the health store
    Health {
        #[command(subcommand)]
        action: commands::health::HealthAction,
    },
    /// Device status and workout control
    Device {
        #[command(subcommand)]
        action: commands::device::DeviceAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// RUST_LOG wins, then `-v`, then the configured level.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose {
            "debug".to_string()
        } else {
            Config::load_or_default().logging.level
        };
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::Context {
        address: cli.address,
    };
    let result = match cli.command {
        Commands::Sessions { action } => commands::sessions::run(action, &ctx).await,
        Commands::Health { action } => commands::health::run(action, &ctx).await,
        Commands::Device { action } => commands::device::run(action, &ctx).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
