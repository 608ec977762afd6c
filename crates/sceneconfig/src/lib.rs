use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    pub version: u32,
    pub window: WindowSettings,
    pub animation: AnimationSettings,
    pub shaders: ShaderPaths,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub power: PowerSetting,
}

/// Drift and zoom tunables; see the renderer's `AnimationPolicy`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub scale_sum: f64,
    pub drift: f64,
    pub pointer_gain: f64,
    pub pointer_zoom: f64,
    pub contour_drift_ratio: f64,
    pub initial_offset: [f64; 2],
}

/// Optional WGSL overrides. Relative paths are resolved against the directory
/// holding the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShaderPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contour: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            window: WindowSettings::default(),
            animation: AnimationSettings::default(),
            shaders: ShaderPaths::default(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "topo".to_string(),
            power: PowerSetting::default(),
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            scale_sum: 6.0,
            drift: 0.1,
            pointer_gain: 0.5,
            pointer_zoom: 0.0,
            contour_drift_ratio: 1.0,
            initial_offset: [100.0, 100.0],
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CURRENT_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CURRENT_VERSION}",
                self.version
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let animation = &self.animation;
        if !(animation.scale_sum.is_finite() && animation.scale_sum > 0.0) {
            return Err(ConfigError::Invalid(
                "animation.scale_sum must be a positive number".into(),
            ));
        }
        for (name, value) in [
            ("drift", animation.drift),
            ("pointer_gain", animation.pointer_gain),
            ("contour_drift_ratio", animation.contour_drift_ratio),
            ("initial_offset[0]", animation.initial_offset[0]),
            ("initial_offset[1]", animation.initial_offset[1]),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "animation.{name} must be finite"
                )));
            }
        }
        if !(animation.pointer_zoom.is_finite() && animation.pointer_zoom >= 0.0) {
            return Err(ConfigError::Invalid(
                "animation.pointer_zoom must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Rewrites relative shader paths so they are relative to `base` instead
    /// of the working directory.
    pub fn resolve_relative_paths(&mut self, base: &Path) {
        for path in [&mut self.shaders.noise, &mut self.shaders.contour]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
