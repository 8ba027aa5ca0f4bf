//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the watchface.toml file.
//! It provides a centralized way to configure the clock style, the face layout,
//! the weather location and the message buffer sizes.

use crate::{FontVariant, TemperatureUnit};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "watchface.toml";

/// Application configuration loaded from watchface.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Clock formatting
    pub clock: ClockConfig,
    /// Face layout and behaviour
    pub face: FaceConfig,
    /// Weather location and refresh settings
    pub weather: WeatherConfig,
    /// AppMessage buffer sizes
    pub message: MessageConfig,
}

/// Clock formatting configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Show "13:05" instead of "01:05"
    pub use_24h: bool,
}

/// Face layout configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Font family; picks both the fonts and the layer geometry
    pub font: FontVariant,
    /// Display width in pixels
    pub width: u32,
    /// Display height in pixels
    pub height: u32,
    /// Weather text shown until the phone answers
    pub loading_text: String,
    /// Long vibration pulse at the top of every hour
    pub hourly_vibe: bool,
}

/// Weather configuration, used by the phone-side companion
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Minutes between weather requests; a request goes out when
    /// `minute % refresh_minutes == 0`, so loading rounds the value down to
    /// a divisor of 60 (60 and above means hourly, 0 disables requests)
    pub refresh_minutes: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub unit: TemperatureUnit,
    /// Append the condition word ("Cloudy") to the temperature
    pub show_conditions: bool,
    /// Companion cache file
    pub cache_path: String,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

/// AppMessage buffer sizes in bytes
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageConfig {
    pub inbox_size: usize,
    pub outbox_size: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig { use_24h: true }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        FaceConfig {
            font: FontVariant::Solaria,
            width: 144,  // Pebble-class display
            height: 168, // Pebble-class display
            loading_text: "Loading...".to_string(),
            hourly_vibe: true,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            refresh_minutes: 30,
            latitude: 40.7128,
            longitude: -74.0060,
            unit: TemperatureUnit::Fahrenheit,
            show_conditions: false,
            cache_path: "/tmp/watchface_weather.json".to_string(),
            cache_ttl_minutes: 30,
            timeout_secs: 10,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        MessageConfig {
            inbox_size: 128,
            outbox_size: 128,
        }
    }
}

impl Config {
    /// Load configuration from watchface.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(mut config) => {
                    let refresh = refresh_interval(config.weather.refresh_minutes);
                    if refresh != config.weather.refresh_minutes {
                        warn!(
                            configured = config.weather.refresh_minutes,
                            using = refresh,
                            "weather refresh must divide the hour"
                        );
                        config.weather.refresh_minutes = refresh;
                    }
                    info!(path = %path.display(), font = ?config.face.font, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to watchface.toml
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

/// Largest divisor of 60 not above `minutes`; 0 stays 0.
pub fn refresh_interval(minutes: u32) -> u32 {
    match minutes {
        0 => 0,
        60..=u32::MAX => 60,
        m => (1..=m).rev().find(|d| 60 % d == 0).unwrap_or(1),
    }
}
