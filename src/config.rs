//! Configuration file support for rgbd-annotate.
//!
//! Settings are stored as pretty JSON in the platform config directory and
//! can be exported and imported with the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_OFFSET_DX, DEFAULT_OFFSET_DY, DEFAULT_OVERLAY_ALPHA, DEFAULT_STORE_FILENAME,
};
use crate::model::{OffsetVector, ValidationError};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_app_name() -> String {
    "rgbd-annotate".to_string()
}

/// Offset as written in the config file. Validated on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetSetting {
    pub dx: i32,
    pub dy: i32,
}

impl Default for OffsetSetting {
    fn default() -> Self {
        Self {
            dx: DEFAULT_OFFSET_DX,
            dy: DEFAULT_OFFSET_DY,
        }
    }
}

impl From<OffsetVector> for OffsetSetting {
    fn from(offset: OffsetVector) -> Self {
        Self {
            dx: offset.dx(),
            dy: offset.dy(),
        }
    }
}

/// User preferences section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Annotation store file
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Offset applied when a session starts
    #[serde(default)]
    pub default_offset: OffsetSetting,

    /// Depth overlay blending weight, clamped to `[0, 1]` on load
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILENAME)
}

fn default_overlay_alpha() -> f32 {
    DEFAULT_OVERLAY_ALPHA
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_offset: OffsetSetting::default(),
            overlay_alpha: default_overlay_alpha(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: Preferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    ///
    /// The default offset must lie within the slider range; the overlay
    /// alpha is clamped instead of rejected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.default_offset()?;
        let alpha = crate::overlay::clamp_alpha(config.preferences.overlay_alpha);
        if alpha != config.preferences.overlay_alpha {
            log::warn!(
                "Overlay alpha {} out of range, using {}",
                config.preferences.overlay_alpha,
                alpha
            );
            config.preferences.overlay_alpha = alpha;
        }

        Ok(config)
    }

    /// The configured starting offset.
    pub fn default_offset(&self) -> Result<OffsetVector, ConfigError> {
        let OffsetSetting { dx, dy } = self.preferences.default_offset;
        Ok(OffsetVector::new(dx, dy)?)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "rgbd-annotate-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("rgbd-annotate").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("rgbd-annotate")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to an explicit path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to_path(&path)?;
        Ok(path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Default offset outside the allowed range
    #[error("Invalid default offset: {0}")]
    InvalidOffset(#[from] ValidationError),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Neither a config nor a home directory could be determined
    #[error("Could not determine config directory")]
    NoConfigDir,
}
