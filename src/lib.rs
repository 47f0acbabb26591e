//! Exam proctoring alert engine: detector adapters turn camera, microphone
//! and browser signals into alert candidates, a single alerting engine
//! throttles and records them, and a reporter persists each session.

pub mod alerting;
pub mod db;
pub mod detectors;
pub mod error;
pub mod models;
pub mod replay;
pub mod reporter;
pub mod sensing;
pub mod settings;
pub mod utils;

pub use alerting::{AlertingEngine, EngineHandle, EngineSnapshot};
pub use error::{MonitorError, PolicyError};
pub use sensing::{MonitorController, SignalSource, SourceKind};
pub use settings::{MonitorSettings, SettingsStore};

/// Installs the global logger (reads `RUST_LOG`, defaults to info).
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
