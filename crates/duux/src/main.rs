use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use duux::api::ApiResult;
use duux::config::read_json;
use duux::coordinator::FixedSource;
use duux::payload;
use duux::Blocking;
use duux::BlockingDuuxApi;
use duux::ClimateEntity;
use duux::Config;
use duux::Coordinator;
use duux::Coordinators;
use duux::DeviceDescriptor;
use duux::Entity;
use duux::HeaterFamily;
use duux::HvacMode;
use duux::Snapshot;
use duux::WatchCoordinator;
use serde_json::Value;
use tracing::info;

#[derive(Parser)]
#[command(name = "duux", version, about = "Inspect and control Duux heaters as climate entities")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every heater in the inventory as a climate entity
    Entities,

    /// Run preset discovery on a single device descriptor
    Presets {
        /// JSON file holding one device descriptor
        device: PathBuf,

        /// JSON file holding the device's current state
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Override the descriptor's sensorTypeId
        #[arg(long)]
        sensor_type: Option<i64>,
    },

    /// Dry-run a command against a heater from the inventory
    Control {
        /// Device address (deviceId)
        address: String,

        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand)]
enum Action {
    /// Set the target temperature
    Temperature { value: f64 },

    /// Switch between off and heat
    Hvac { mode: HvacMode },

    /// Select a preset by name
    Preset { name: String },
}

/// Command API that logs instead of talking to the cloud.
struct DryRunApi;

impl BlockingDuuxApi for DryRunApi {
    fn set_temperature(&self, address: &str, temperature: f64) -> ApiResult<()> {
        info!("[{}] would set temperature to {}", address, temperature);
        Ok(())
    }

    fn set_power(&self, address: &str, on: bool) -> ApiResult<()> {
        info!("[{}] would set power {}", address, on);
        Ok(())
    }

    fn set_mode(&self, address: &str, mode: &str) -> ApiResult<()> {
        info!("[{}] would set mode {}", address, mode);
        Ok(())
    }

    fn send_command(&self, address: &str, command: &str) -> ApiResult<()> {
        info!("[{}] would send '{}'", address, command);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter()?)
        .init();

    match cli.command {
        Command::Entities => {
            for entity in load_entities(&config).await? {
                println!("{}", serde_json::to_string_pretty(&entity.state_json())?);
            }
        }
        Command::Presets {
            device,
            snapshot,
            sensor_type,
        } => {
            let device: Value = read_json(&device)?;
            let snapshot: Option<Snapshot> = snapshot.map(|path| read_json(&path)).transpose()?;
            let code = sensor_type
                .or_else(|| device.get("sensorTypeId").and_then(payload::whole_number));
            let family = HeaterFamily::from_sensor_type(code);
            info!("Discovering presets as {}", family);

            let presets = duux::discover_presets(snapshot.as_ref(), &device, family);
            println!("{}", serde_json::to_string_pretty(&presets)?);
        }
        Command::Control { address, action } => {
            let entities = load_entities(&config).await?;
            let entity = entities
                .iter()
                .find(|e| e.address() == address)
                .with_context(|| format!("No heater with address {}", address))?;

            match action {
                Action::Temperature { value } => entity.set_temperature(Some(value)).await?,
                Action::Hvac { mode } => entity.set_hvac_mode(mode).await?,
                Action::Preset { name } => entity.set_preset_mode(&name).await?,
            }

            println!("{}", serde_json::to_string_pretty(&entity.state_json())?);
        }
    }

    Ok(())
}

/// Build entities for the configured inventory, each coordinator seeded from
/// the snapshots file.
async fn load_entities(config: &Config) -> anyhow::Result<Vec<ClimateEntity>> {
    let inventory = config
        .inventory
        .as_ref()
        .context("Configuration has no [inventory] section")?
        .load()?;

    let source = Arc::new(FixedSource::new(inventory.snapshots));
    let mut coordinators = Coordinators::new();
    for device in &inventory.devices {
        let Ok(device) = DeviceDescriptor::from_json(device.clone()) else {
            continue;
        };
        let coordinator = WatchCoordinator::new(device.address, source.clone());
        coordinator.request_refresh().await;
        coordinators.insert(coordinator.address().to_string(), Arc::new(coordinator));
    }

    let api = Arc::new(Blocking::new(DryRunApi));
    Ok(duux::setup_entities(&inventory.devices, &coordinators, api))
}
