// # beacond - Beacon Daemon
//
// Thin integration layer around beacon-core. The daemon is responsible
// for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the interface source, settings store and mDNS backend
// 4. Running the reconciliation engine until SIGINT/SIGTERM
//
// All advertisement logic lives in beacon-core; nothing here plans,
// diffs or retries.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `BEACON_SETTINGS_PATH`: Settings file (default /var/lib/beacon/settings.json)
// - `BEACON_LOG_LEVEL`: trace|debug|info|warn|error (default info)
// - `BEACON_INTERVAL_SECS`: Seconds between reconciliation cycles (default 10)
// - `BEACON_TTL_SECS`: Advertisement TTL passed to the backend (default 25)
// - `BEACON_OP_TIMEOUT_SECS`: Deadline per backend call (default 15)
// - `BEACON_STARTUP_DELAY_SECS`: Settle time before the first cycle (default 0)
//
// The settings file itself (blacklist, domains, advertise lists, service
// templates) is created with builtin defaults on first run and can be
// edited while the daemon runs; changes take effect on the next cycle.
//
// ## Example
//
// ```bash
// export BEACON_SETTINGS_PATH=/var/lib/beacon/settings.json
// export BEACON_LOG_LEVEL=debug
//
// beacond
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use beacon_core::{BeaconEngine, EngineConfig, EngineEvent, FileSettingsStore};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum BeaconExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<BeaconExitCode> for ExitCode {
    fn from(code: BeaconExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    settings_path: String,
    interval_secs: u64,
    ttl_secs: u32,
    op_timeout_secs: u64,
    startup_delay_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            settings_path: env::var("BEACON_SETTINGS_PATH")
                .unwrap_or_else(|_| "/var/lib/beacon/settings.json".to_string()),
            interval_secs: parse_env("BEACON_INTERVAL_SECS", 10)?,
            ttl_secs: parse_env("BEACON_TTL_SECS", 25)?,
            op_timeout_secs: parse_env("BEACON_OP_TIMEOUT_SECS", 15)?,
            startup_delay_secs: parse_env("BEACON_STARTUP_DELAY_SECS", 0)?,
            log_level: env::var("BEACON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.settings_path.is_empty() {
            anyhow::bail!(
                "BEACON_SETTINGS_PATH cannot be empty. \
                Set it via: export BEACON_SETTINGS_PATH=/var/lib/beacon/settings.json"
            );
        }

        if !(1..=3600).contains(&self.interval_secs) {
            anyhow::bail!(
                "BEACON_INTERVAL_SECS must be between 1 and 3600 seconds. Got: {}",
                self.interval_secs
            );
        }

        if !(1..=4500).contains(&self.ttl_secs) {
            anyhow::bail!(
                "BEACON_TTL_SECS must be between 1 and 4500 seconds. Got: {}",
                self.ttl_secs
            );
        }

        if !(1..=300).contains(&self.op_timeout_secs) {
            anyhow::bail!(
                "BEACON_OP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.op_timeout_secs
            );
        }

        if self.startup_delay_secs > 300 {
            anyhow::bail!(
                "BEACON_STARTUP_DELAY_SECS must be at most 300 seconds. Got: {}",
                self.startup_delay_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "BEACON_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            interval_secs: self.interval_secs,
            ttl_secs: self.ttl_secs,
            op_timeout_secs: self.op_timeout_secs,
            startup_delay_secs: self.startup_delay_secs,
            ..EngineConfig::default()
        }
    }
}

/// Parse a numeric environment variable with a default
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return BeaconExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return BeaconExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return BeaconExitCode::ConfigError.into();
    }

    info!("Starting beacond daemon");
    info!("Settings file: {}", config.settings_path);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return BeaconExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            BeaconExitCode::RuntimeError
        } else {
            BeaconExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let interface_source = beacon_if_local::LocalInterfaceSource::new();
    let settings_store = FileSettingsStore::new(&config.settings_path);
    let backend = Arc::new(beacon_backend_mdns::MdnsBackend::new());

    let (engine, mut event_rx) = BeaconEngine::new(
        Box::new(interface_source),
        Box::new(settings_store),
        backend,
        config.engine_config(),
    )?;

    // Surface engine events in the logs
    let event_logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::Started { interval_secs } => {
                    info!("Engine started, cycling every {}s", interval_secs)
                }
                EngineEvent::RunnerRegistered { name } => info!("Advertising {}", name),
                EngineEvent::RunnerUnregistered { name } => info!("Withdrew {}", name),
                EngineEvent::RunnerFailed { name, error } => {
                    warn!("Runner {} failed: {} (retrying next cycle)", name, error)
                }
                EngineEvent::SettingsReloadFailed { error } => {
                    warn!("Settings reload failed: {}", error)
                }
                EngineEvent::CycleCompleted { .. } => {}
                EngineEvent::Stopped { reason } => info!("Engine stopped: {}", reason),
            }
        }
    });

    info!("Running reconciliation engine (ctrl-c to stop)");
    let result = engine.run().await;

    event_logger.abort();
    result?;
    info!("Shutdown complete");
    Ok(())
}
