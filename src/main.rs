use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teleinfo_rs::constants::DOMOTICZ_BASE_URL;
use teleinfo_rs::teleinfo::serial::SerialConfig;
use teleinfo_rs::util::hex::decode_hex;
use teleinfo_rs::{
    decode_bytes, init_logger, log_info, BridgeConfig, DomoticzClient, DomoticzLog, Teleinfo,
    TeleinfoError, TeleinfoOptions,
};

#[derive(Parser)]
#[command(name = "teleinfo-cli")]
#[command(about = "Bridge electric meter teleinfo to Domoticz")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the serial stream and feed the configured sensors until Ctrl-C
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the configured serial device
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Decode captured traffic and print the valid records
    Decode {
        #[arg(long, conflicts_with = "file")]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Query the state of a Domoticz device
    Status {
        idx: u32,
        #[arg(long, default_value = DOMOTICZ_BASE_URL)]
        url: String,
    },
    /// Add a message to the Domoticz log
    Log {
        message: String,
        #[arg(long, default_value = DOMOTICZ_BASE_URL)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), TeleinfoError> {
    init_logger();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, device } => {
            let mut config = match config {
                Some(path) => BridgeConfig::load(&path)?,
                None => BridgeConfig::default(),
            };
            if let Some(device) = device {
                config.serial.device = device;
            }
            run(config).await?;
        }
        Commands::Decode { hex, file } => {
            let data = match (hex, file) {
                (Some(hex), _) => decode_hex(&hex)?,
                (None, Some(path)) => std::fs::read(&path)
                    .map_err(|e| TeleinfoError::Other(format!("{}: {e}", path.display())))?,
                (None, None) => {
                    return Err(TeleinfoError::Other("give --hex or --file".into()));
                }
            };
            for record in decode_bytes(&data) {
                println!("{} {}", record.label, record.value);
            }
        }
        Commands::Status { idx, url } => {
            let client = DomoticzClient::new(&url, Duration::from_secs(5))?;
            let status = client.device_status(idx).await?;
            println!("{idx}: {status:?}");
        }
        Commands::Log { message, url } => {
            let client = DomoticzClient::new(&url, Duration::from_secs(5))?;
            let log = DomoticzLog::new(Arc::new(client));
            log.send(message);
            if log.close().await == 0 {
                return Err(TeleinfoError::HttpError("message not accepted".into()));
            }
        }
    }

    Ok(())
}

async fn run(config: BridgeConfig) -> Result<(), TeleinfoError> {
    let client = DomoticzClient::new(
        &config.domoticz.base_url,
        Duration::from_secs(config.domoticz.timeout_secs),
    )?;
    let options = TeleinfoOptions::from_config(&config.sensors, Arc::new(client))?;
    let serial = SerialConfig {
        baudrate: config.serial.baudrate,
        ..SerialConfig::default()
    };
    let session = Teleinfo::open_with_config(&config.serial.device, &serial, options)?;
    log_info(&format!("Reading teleinfo from {}", config.serial.device));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| TeleinfoError::Other(format!("signal handler: {e}")))?;
    let snapshot = session.snapshot();
    log_info(&format!(
        "Stopping: current={:?} A, power={:?} VA, index={:?} Wh, {:?}",
        snapshot.current,
        snapshot.power,
        snapshot.index,
        session.stats()
    ));
    session.stop();
    session.join().await
}
