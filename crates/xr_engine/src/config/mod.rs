//! Configuration system

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::systems::SelectionMode;

/// Configuration trait
///
/// File format is chosen by extension; TOML and RON are supported.
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Runtime knobs for the composition root
///
/// Everything here is plain data; the one piece of configuration that is
/// code (the pick predicate) lives on [`crate::systems::InteractionConfig`]
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scene background color
    pub background: [f32; 3],

    /// Camera vertical field of view in degrees
    pub camera_fov_y: f32,

    /// Initial locomotion speed multiplier
    pub speed_multiplier: f32,

    /// Base locomotion speed in units per second
    pub speed: f32,

    /// Locomotion yaw rate in radians per second
    pub rotation_rate: f32,

    /// Locomotion input dead-zone
    pub dead_zone: f32,

    /// Laser pointer color
    pub ray_color: [f32; 3],

    /// Which selection policy drives select/deselect
    pub selection: SelectionMode,

    /// Whether a selected object follows the controller while held
    pub grabbable: bool,

    /// Whether picking also tests descendants of matching children
    pub recursive_raycast: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            background: [0.53, 0.81, 0.92], // sky blue
            camera_fov_y: 30.0,
            speed_multiplier: 1.0,
            speed: 1.0,
            rotation_rate: 2.0,
            dead_zone: 0.1,
            ray_color: [1.0, 1.0, 1.0],
            selection: SelectionMode::Transient,
            grabbable: false,
            recursive_raycast: false,
        }
    }
}

impl Config for RuntimeConfig {}
