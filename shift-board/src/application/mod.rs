pub mod config;
pub mod controller;
pub mod error;
pub mod sweep;

pub use config::BoardConfig;
pub use controller::{LoadState, SharedBoard, ShiftBoard, ShiftSnapshot};
pub use error::{BoardError, BoardResult, ConfigError};
pub use sweep::SweepTask;
