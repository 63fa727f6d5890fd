//! TOML-based configuration for Clinistat.
//!
//! Example configuration:
//! ```toml
//! [analysis]
//! default_granularity = "month"
//! decimal_places = 1
//!
//! [[age_ranges]]
//! label = "<15"
//! min = 0
//! max = 14
//!
//! [[age_ranges]]
//! label = "15+"
//! min = 15
//!
//! [[sources]]
//! id = "depistageVih"
//! label = "HIV screening"
//! date_fields = ["dateDepistage", "date"]
//! org_unit_fields = ["etablissementId"]
//!
//! [[categories]]
//! id = "status"
//! name = "Client status"
//! field = "client.status"
//! values = [{ value = "nouveau", label = "New" }, { value = "ancien", label = "Returning" }]
//!
//! [[services]]
//! id = "pf"
//! label = "Family planning"
//! source = "planning"
//!
//! [[services.properties]]
//! id = "new_acceptors"
//! label = "PF new acceptors"
//! kind = "flag"
//! field = "nouvelleAcceptante"
//! total = true
//!
//! [logging]
//! filter = "clinistat=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dimension::{AgeBin, CategoryDefinition};
use crate::fetch::SourceDefinition;
use crate::indicator::ServiceDefinition;
use crate::period::Granularity;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Engine-wide defaults and labels.
    pub analysis: AnalysisSettings,

    /// Age range bins for the `age_range` dimension.
    pub age_ranges: Vec<AgeBin>,

    /// Record sources and their field accessors.
    pub sources: Vec<SourceDefinition>,

    /// Configurable categorical dimensions.
    pub categories: Vec<CategoryDefinition>,

    /// Service property sets for generated indicators.
    pub services: Vec<ServiceDefinition>,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            age_ranges: AgeBin::defaults(),
            sources: SourceDefinition::defaults(),
            categories: CategoryDefinition::defaults(),
            services: ServiceDefinition::defaults(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Analysis defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Period-dimension granularity for fixed periods that name none.
    pub default_granularity: Granularity,

    /// Decimal places for decimal and currency values.
    pub decimal_places: usize,

    /// Label for values that cannot be resolved (unknown facility, no date).
    pub unknown_label: String,

    /// Label for categorical values missing from a record.
    pub not_specified_label: String,

    /// Label for dimension values absent from a data point.
    pub missing_label: String,

    /// Label of the synthetic row used when no row dimension is configured.
    pub total_label: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_granularity: Granularity::Month,
            decimal_places: 1,
            unknown_label: "Unknown".to_string(),
            not_specified_label: "Not specified".to_string(),
            missing_label: "N/A".to_string(),
            total_label: "Total".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` env-filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "clinistat=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CLINISTAT_CONFIG`
    /// 2. `./clinistat.toml`
    /// 3. `<config dir>/clinistat/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CLINISTAT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("clinistat.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("clinistat").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for bin in &self.age_ranges {
            if let Some(max) = bin.max {
                if max < bin.min {
                    return Err(SettingsError::InvalidConfig(format!(
                        "age range {} has max {} below min {}",
                        bin.label, max, bin.min
                    )));
                }
            }
        }

        ensure_unique("source", self.sources.iter().map(|s| s.id.as_str()))?;
        ensure_unique("category", self.categories.iter().map(|c| c.id.as_str()))?;
        ensure_unique("service", self.services.iter().map(|s| s.id.as_str()))?;

        for service in &self.services {
            ensure_unique(
                &format!("property of service {}", service.id),
                service.properties.iter().map(|p| p.id.as_str()),
            )?;
        }

        Ok(())
    }
}

fn ensure_unique<'a>(
    what: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), SettingsError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SettingsError::InvalidConfig(format!("duplicate {} id: {}", what, id)));
        }
    }
    Ok(())
}
