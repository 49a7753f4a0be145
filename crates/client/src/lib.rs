//! Command-line stealth simulator.
//!
//! Loads content through `stealth-content`, spawns a scenario into the
//! in-memory scene, registers a perception agent per guard, and steps the
//! simulation on a fixed timestep while logging every transition.

pub mod config;
pub mod logging;
pub mod sim;

pub use config::SimConfig;
pub use sim::{RunSummary, build_simulation, run};
