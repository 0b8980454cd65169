//! Horde simulator
//!
//! Runs a scripted encounter headless and logs what the horde did.
//!
//! ```text
//! horde-sim [scenario.toml]
//! RUST_LOG=debug HORDE_SEED=7 horde-sim crates/horde_sim/sim.toml
//! ```

mod player;
mod sim_config;
mod simulation;

use sim_config::SimConfig;
use simulation::Simulation;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    log::info!("horde-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = match SimConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    config.print_summary();

    let mut simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(err) => {
            log::error!("Failed to set up simulation: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let report = simulation.run();
    report.print_summary();
    ExitCode::SUCCESS
}
