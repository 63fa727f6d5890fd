//! Configuration module for Clinistat.
//!
//! Handles the TOML settings file: engine defaults, age bins, source
//! accessors, categorical dimensions, service property sets and logging.

mod settings;

pub use settings::{AnalysisSettings, LoggingSettings, Settings, SettingsError};
