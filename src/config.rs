//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-config.toml file.
//! It provides a centralized way to configure the location, the WorldTides API
//! settings, the prediction window, and the extremum search tolerances.

use crate::extremes::SearchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Where to predict tides
    pub location: LocationConfig,
    /// WorldTides API access and response caching
    pub api: ApiConfig,
    /// Prediction window and output resolution
    pub prediction: PredictionConfig,
    /// Extremum search tuning
    pub search: SearchSettings,
}

/// Location of interest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Human-readable name for reference
    pub name: String,
}

/// WorldTides API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API key from www.worldtides.info (empty means not configured)
    pub key: String,
    /// API endpoint
    pub base_url: String,
    /// Chart datum for datum-referenced heights (e.g. "LAT", "MLLW", "MSL")
    pub datum: String,
    /// Where the last response is cached
    pub cache_path: String,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// Drop constituents missing from the catalog instead of failing
    pub skip_unknown_constituents: bool,
}

/// Prediction window configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionConfig {
    /// Length of the prediction window starting now
    pub window_hours: i64,
    /// Spacing of the water height table
    pub height_interval_minutes: i64,
}

/// Extremum search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Largest coarse sampling step
    pub max_step_minutes: f64,
    /// Time precision of reported highs and lows
    pub tolerance_seconds: f64,
    /// Refinement rounds per extreme before settling for the best bracket
    pub max_iterations: u32,
}

impl SearchSettings {
    pub fn to_search_config(&self) -> SearchConfig {
        SearchConfig {
            max_step_secs: self.max_step_minutes * 60.0,
            tolerance_secs: self.tolerance_seconds,
            max_iterations: self.max_iterations,
            ..SearchConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let search = SearchConfig::default();
        Config {
            location: LocationConfig {
                latitude: 43.6567,
                longitude: -70.2467,
                name: "Portland, ME".to_string(),
            },
            api: ApiConfig {
                key: String::new(),
                base_url: "https://www.worldtides.info/api".to_string(),
                datum: "LAT".to_string(),
                cache_path: "/tmp/tide_constituents.json".to_string(),
                cache_ttl_minutes: 24 * 60,
                skip_unknown_constituents: true,
            },
            prediction: PredictionConfig {
                window_hours: 24,
                height_interval_minutes: 30,
            },
            search: SearchSettings {
                max_step_minutes: search.max_step_secs / 60.0,
                tolerance_seconds: search.tolerance_secs,
                max_iterations: search.max_iterations,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("tide-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration for location: {}", config.location.name);
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration (Portland, ME)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration (Portland, ME)");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
