//! Engine binary for the carrybot simulation.
//!
//! Loads configuration, sets up structured logging, builds the seeded
//! arena and agent, and runs the tick loop until a limit is reached, the
//! round ends, or the process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `carrybot.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation from config
//! 4. Create operator state from the run bounds
//! 5. Install the Ctrl-C stop handler
//! 6. Run the simulation loop
//! 7. Log the result

mod error;
mod event_log;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use carrybot_core::config::{LoggingConfig, SimulationConfig};
use carrybot_core::{OperatorState, Simulation, log_simulation_end, run_simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::event_log::EventLogCallback;

/// Config file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "carrybot.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        path = %path.display(),
        from_file,
        world_name = config.world.name,
        seed = config.world.seed,
        tick_secs = config.world.tick_secs,
        tick_interval_ms = config.world.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let mut sim = Simulation::from_config(&config).map_err(EngineError::from)?;

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::new(config.world.tick_interval_ms, &config.bounds));

    // 5. Stop cleanly on Ctrl-C.
    let stopper = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current tick");
            stopper.request_stop();
        }
    });

    // 6. Run the simulation.
    let mut callback = EventLogCallback::new();
    let result = run_simulation(&mut sim, &operator, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    log_simulation_end(&result);
    let tally = callback.tally();
    info!(
        end_reason = ?result.end_reason,
        deliveries = tally.deliveries,
        scored_releases = tally.scored_releases,
        low_battery = tally.low_battery,
        overrides = tally.overrides,
        full_charges = tally.full_charges,
        "carrybot-engine shutdown complete"
    );

    Ok(())
}

/// Load the configuration, falling back to defaults when the file is absent.
///
/// The second value reports whether the file was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        return Ok((SimulationConfig::from_file(path)?, true));
    }
    let mut config = SimulationConfig::default();
    config.apply_env_overrides(|var| std::env::var(var).ok())?;
    Ok((config, false))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let (config, from_file) = load_config(Path::new("does-not-exist.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config.world.name, "carrybot");
    }

    #[test]
    fn project_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../carrybot.yaml");
        if path.exists() {
            let (config, from_file) = load_config(&path).unwrap();
            assert!(from_file);
            assert!(config.world.tick_secs > 0.0);
        }
    }
}
