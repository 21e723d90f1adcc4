//! Trajectory Deviation - Command-line Application Library
//!
//! Reads a reference path and one or more driven paths from whitespace-separated text
//! files, evaluates them with [`trajectory_deviation_lib::TrajectoryEngine`] and writes
//! per-point results as text or JSON.

mod error;
pub mod input;
pub mod logging;
pub mod output;
mod run;
mod settings;

pub use error::CliError;
pub use run::run;
pub use settings::Settings;
