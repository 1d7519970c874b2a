//! Project configuration.
//!
//! The metadata service hands each session a [`ProjectConfig`]: image and
//! mask geometry, the class table, the view catalog and prediction settings.
//! The same structure holds the user's edited view groups and preferences and
//! can be written to and read back from disk.

use rmat_view::{DEFAULT_GROUP, View, ViewGroup, ViewKind};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_EPOCHS, DEFAULT_MAX_TRAIN_PIXELS, DEFAULT_SEED, DEFAULT_TRAIN_RATIO,
};
use crate::mask::{MaskArea, MaskShape};
use crate::model::{MaskClass, default_classes};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

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

/// Largest class table a byte-valued mask can address.
pub const MAX_CLASSES: usize = 256;

/// Settings of the prediction round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Share of each class's user pixels sent as training data
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    /// Cap of training pixels per class
    #[serde(default = "default_max_train_pixels")]
    pub max_train_pixels: usize,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: u32,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_n_leaves")]
    pub n_leaves: u32,
    /// Whether the classifier may use neighbouring pixels
    #[serde(default)]
    pub include_context: bool,
    /// Seed of the sampling generator
    #[serde(default = "default_seed")]
    pub seed: u32,
}

fn default_train_ratio() -> f64 {
    DEFAULT_TRAIN_RATIO
}

fn default_max_train_pixels() -> usize {
    DEFAULT_MAX_TRAIN_PIXELS
}

fn default_n_estimators() -> u32 {
    50
}

fn default_max_depth() -> u32 {
    10
}

fn default_n_leaves() -> u32 {
    10
}

fn default_seed() -> u32 {
    DEFAULT_SEED
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            train_ratio: default_train_ratio(),
            max_train_pixels: default_max_train_pixels(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            n_leaves: default_n_leaves(),
            include_context: false,
            seed: default_seed(),
        }
    }
}

/// Undo history section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
}

fn default_max_epochs() -> usize {
    DEFAULT_MAX_EPOCHS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_epochs: default_max_epochs(),
        }
    }
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Window height kept free below the view ports
    #[serde(default = "default_reserved_height")]
    pub reserved_height: u32,

    /// Endpoint of the external map embed
    #[serde(default = "default_map_url")]
    pub map_url: String,
}

fn default_reserved_height() -> u32 {
    rmat_view::manager::DEFAULT_RESERVED_HEIGHT
}

fn default_map_url() -> String {
    rmat_view::layer::DEFAULT_MAP_URL.to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            reserved_height: default_reserved_height(),
            map_url: default_map_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Image width and height in pixels
    pub image_shape: [u32; 2],

    /// Editable sub-rectangle `[x0, y0, x1, y1]` of the image
    pub mask_area: [u32; 4],

    #[serde(default = "default_classes")]
    pub classes: Vec<MaskClass>,

    #[serde(default = "default_views")]
    pub views: Vec<View>,

    #[serde(default)]
    pub view_groups: Vec<ViewGroup>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_views() -> Vec<View> {
    vec![View::new("RGB", ViewKind::Image).with_description("Normal RGB image.")]
}

impl ProjectConfig {
    /// Configuration for an image whose mask covers all of it.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let mut config = Self {
            version: CONFIG_VERSION,
            image_shape: [image_width, image_height],
            mask_area: [0, 0, image_width, image_height],
            classes: default_classes(),
            views: default_views(),
            view_groups: Vec::new(),
            ai: AiConfig::default(),
            history: HistoryConfig::default(),
            preferences: UserPreferences::default(),
        };
        config.ensure_default_group();
        config
    }

    pub fn mask_area(&self) -> MaskArea {
        let [x0, y0, x1, y1] = self.mask_area;
        MaskArea::new(x0, y0, x1, y1)
    }

    /// Mask dimensions derived from the mask area.
    pub fn mask_shape(&self) -> MaskShape {
        self.mask_area().shape()
    }

    /// Add a `default` group listing every view if there is none.
    pub fn ensure_default_group(&mut self) {
        if self.view_groups.iter().any(|g| g.name == DEFAULT_GROUP) {
            return;
        }
        let all = self.views.iter().map(|v| v.name.clone()).collect();
        self.view_groups.insert(0, ViewGroup::new(DEFAULT_GROUP, all));
    }

    /// Check geometry, class table and view groups.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.image_shape;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidGeometry(format!(
                "image shape {}x{} is empty",
                width, height
            )));
        }

        let [x0, y0, x1, y1] = self.mask_area;
        if x1 <= x0 || y1 <= y0 {
            return Err(ConfigError::InvalidGeometry(format!(
                "mask area {:?} is empty",
                self.mask_area
            )));
        }
        if x1 > width || y1 > height {
            return Err(ConfigError::InvalidGeometry(format!(
                "mask area {:?} exceeds image {}x{}",
                self.mask_area, width, height
            )));
        }

        if self.classes.is_empty() {
            return Err(ConfigError::InvalidClasses("no classes defined".to_string()));
        }
        if self.classes.len() > MAX_CLASSES {
            return Err(ConfigError::InvalidClasses(format!(
                "{} classes exceed the limit of {}",
                self.classes.len(),
                MAX_CLASSES
            )));
        }

        if !(self.ai.train_ratio > 0.0 && self.ai.train_ratio <= 1.0) {
            return Err(ConfigError::InvalidAi(format!(
                "train ratio {} outside (0, 1]",
                self.ai.train_ratio
            )));
        }

        for group in &self.view_groups {
            if let Some(missing) = group
                .views
                .iter()
                .find(|name| !self.views.iter().any(|v| &v.name == *name))
            {
                return Err(ConfigError::InvalidViews(format!(
                    "group '{}' references unknown view '{}'",
                    group.name, missing
                )));
            }
        }

        Ok(())
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.ensure_default_group();
        config.validate()?;
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "rmat-config.json"
    }

    /// Get the default config file path for auto-load/save.
    /// Returns None on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("rmat").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("rmat")
                    .join(Self::default_filename())
            })
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
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

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid class table: {0}")]
    InvalidClasses(String),

    #[error("Invalid prediction settings: {0}")]
    InvalidAi(String),

    #[error("Invalid views: {0}")]
    InvalidViews(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
