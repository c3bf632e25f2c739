mod roles;

use std::path::PathBuf;

use anyhow::Context;
use buzzlink_core::NodeConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(
    name = "buzzlink",
    about = "Edge-triggered, rate-limited presence notifications from a sensor to a remote buzzer",
    version,
    propagate_version = true
)]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true, env = "BUZZLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll presence, notify the buzzer on each new episode, serve /video and /stop
    Detector {
        /// File holding the latest presence flag or distance in cm
        #[arg(long, default_value = "/run/buzzlink/presence")]
        signal_path: PathBuf,

        /// Buzzer endpoint notified once per episode
        #[arg(long, env = "BUZZLINK_NOTIFY_URL")]
        notify_url: Option<String>,

        /// Port for the start/stop control endpoint
        #[arg(long)]
        control_port: Option<u16>,

        /// Minimum gap between notifications (ms)
        #[arg(long)]
        cooldown_ms: Option<u64>,

        /// Delay between presence samples (ms)
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Sample from startup instead of waiting for GET /video
        #[arg(long)]
        start_enabled: bool,

        /// Use a built-in presence pattern instead of the signal file
        #[arg(long)]
        demo: bool,
    },

    /// Buzz on every notification and send the periodic return notification
    Buzzer {
        /// Port for the notification receiver
        #[arg(long)]
        port: Option<u16>,

        /// GPIO value file driving the buzzer (omit for a dry run)
        #[arg(long)]
        gpio_value_path: Option<PathBuf>,

        /// Detector endpoint for the return notification
        #[arg(long, env = "BUZZLINK_SERVER_URL")]
        server_url: Option<String>,

        /// Buzzer pulse per notification (ms)
        #[arg(long)]
        pulse_ms: Option<u64>,

        /// Do not send the return notification
        #[arg(long)]
        no_heartbeat: bool,
    },

    /// Local proximity beeper: chirps faster as an object gets closer
    Proximity {
        /// File holding the latest distance in cm
        #[arg(long, default_value = "/run/buzzlink/distance")]
        distance_path: PathBuf,

        /// GPIO value file driving the buzzer (omit for a dry run)
        #[arg(long)]
        gpio_value_path: Option<PathBuf>,

        /// Distance at or below which the beeper runs (cm)
        #[arg(long)]
        threshold_cm: Option<f32>,
    },
}

impl Commands {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut NodeConfig) {
        match self {
            Commands::Detector {
                notify_url,
                control_port,
                cooldown_ms,
                poll_interval_ms,
                start_enabled,
                ..
            } => {
                if let Some(url) = notify_url {
                    config.notify.url = url.clone();
                }
                if let Some(port) = control_port {
                    config.detector.control_port = *port;
                }
                if let Some(ms) = cooldown_ms {
                    config.notify.cooldown_ms = *ms;
                }
                if let Some(ms) = poll_interval_ms {
                    config.detector.poll_interval_ms = *ms;
                }
                if *start_enabled {
                    config.detector.start_enabled = true;
                }
            }
            Commands::Buzzer {
                port,
                server_url,
                pulse_ms,
                no_heartbeat,
                ..
            } => {
                if let Some(port) = port {
                    config.receiver.port = *port;
                }
                if let Some(url) = server_url {
                    config.heartbeat.delivery.url = url.clone();
                }
                if let Some(ms) = pulse_ms {
                    config.receiver.pulse_ms = *ms;
                }
                if *no_heartbeat {
                    config.heartbeat.enabled = false;
                }
            }
            Commands::Proximity { threshold_cm, .. } => {
                if let Some(cm) = threshold_cm {
                    config.detector.presence_threshold_cm = *cm;
                }
            }
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    cli.command.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    log::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Detector {
            signal_path, demo, ..
        } => roles::detector(&config, signal_path, demo),
        Commands::Buzzer {
            gpio_value_path, ..
        } => roles::buzzer(&config, gpio_value_path),
        Commands::Proximity {
            distance_path,
            gpio_value_path,
            ..
        } => roles::proximity(&config, distance_path, gpio_value_path),
    }
}
