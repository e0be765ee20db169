//! Compositor settings
//!
//! Uses RON (Rusty Object Notation) for human-readable config files.
//! Every field has a default, so a config file only lists what it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compositor::{MarkerColors, DEFAULT_MAX_ACTORS};
use crate::depth::DEFAULT_PARALLAX_SCALE;
use crate::mode::Mode;

/// Largest view angle magnitude a config may ask for
pub const MAX_VIEW_ANGLE: f32 = 90.0;
/// Largest parallax scale a config may ask for
pub const MAX_PARALLAX_SCALE: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowboxConfig {
    /// Prefix of depth map file names
    pub game_id: String,
    /// Directory holding depth maps
    pub depth_dir: PathBuf,
    /// Visible background size in pixels
    pub screen_width: usize,
    pub screen_height: usize,
    pub view_angle_min: f32,
    pub view_angle_max: f32,
    /// Shift in pixels per unit of view angle at depth 0 and 255
    pub parallax_scale: f32,
    /// Modes visited by the cycle command, in order
    pub cycle: Vec<Mode>,
    pub initial_mode: Mode,
    pub highlight_selection: bool,
    pub markers: MarkerColors,
    /// Subtracted from the raw pointer position
    pub pointer_offset: i32,
    /// Log compose timing every N frames (0 = never)
    pub report_interval: u32,
    pub max_actors: usize,
}

impl Default for ShadowboxConfig {
    fn default() -> Self {
        Self {
            game_id: "game".to_string(),
            depth_dir: PathBuf::from("depth"),
            screen_width: 320,
            screen_height: 200,
            view_angle_min: -5.0,
            view_angle_max: 0.0,
            parallax_scale: DEFAULT_PARALLAX_SCALE,
            cycle: vec![Mode::Off, Mode::Basic, Mode::Gpu],
            initial_mode: Mode::Off,
            highlight_selection: true,
            markers: MarkerColors::default(),
            pointer_offset: 2,
            report_interval: 20,
            max_actors: DEFAULT_MAX_ACTORS,
        }
    }
}

impl ShadowboxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.view_angle_min.is_finite() || !self.view_angle_max.is_finite() {
            return Err(ConfigError::Invalid("view angle range must be finite".to_string()));
        }
        if self.view_angle_min > self.view_angle_max {
            return Err(ConfigError::Invalid(format!(
                "view_angle_min {} is above view_angle_max {}",
                self.view_angle_min, self.view_angle_max
            )));
        }
        if self.view_angle_min < -MAX_VIEW_ANGLE || self.view_angle_max > MAX_VIEW_ANGLE {
            return Err(ConfigError::Invalid(format!(
                "view angle range must lie within [-{}, {}]",
                MAX_VIEW_ANGLE, MAX_VIEW_ANGLE
            )));
        }
        if !(0.0..=MAX_PARALLAX_SCALE).contains(&self.parallax_scale) {
            return Err(ConfigError::Invalid(format!(
                "parallax_scale {} is outside [0, {}]",
                self.parallax_scale, MAX_PARALLAX_SCALE
            )));
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::Invalid("screen size must be non-zero".to_string()));
        }
        if self.cycle.is_empty() {
            return Err(ConfigError::Invalid("mode cycle is empty".to_string()));
        }
        Ok(())
    }
}

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Invalid(s) => write!(f, "Invalid config: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ShadowboxConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

pub fn load_config_from_str(s: &str) -> Result<ShadowboxConfig, ConfigError> {
    let config: ShadowboxConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &ShadowboxConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
