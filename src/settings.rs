//! Runner tuning
//!
//! Every gameplay constant the loop reads lives here so a session can be
//! tuned from JSON. Persisted in LocalStorage on the web.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Game loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Speed gained per tick
    pub acceleration: f64,
    /// Grace period (ms) before the first obstacle
    pub clear_time: f64,
    /// Chance of adding a cloud once there is room
    pub cloud_frequency: f64,
    /// Cool-down (ms) after a crash before a release restarts
    pub gameover_clear_time: f64,
    /// Multiplier on each obstacle type's minimum gap
    pub gap_coefficient: f64,
    pub gravity: f64,
    /// Keyboard/touch jump velocity
    pub initial_jump_velocity: f64,
    pub max_clouds: usize,
    pub max_speed: f64,
    /// Speed boost for surfaces narrower than the default width
    pub mobile_speed_coefficient: f64,
    /// Starting speed
    pub speed: f64,

    // === Audio ===
    /// Effect volume (0.0 - 1.0)
    pub volume: f32,
    pub muted: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            acceleration: 0.001,
            clear_time: 3000.0,
            cloud_frequency: 0.5,
            gameover_clear_time: 750.0,
            gap_coefficient: 1.0,
            gravity: 0.6,
            initial_jump_velocity: 10.0,
            max_clouds: 6,
            max_speed: 12.0,
            mobile_speed_coefficient: 1.2,
            speed: 6.0,

            volume: 1.0,
            muted: false,
        }
    }
}

impl RunnerConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(None, e))
    }

    /// Load from a JSON file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(Some(path.to_path_buf()), e))
    }

    /// Clamp every field into a playable range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, d: f64| if v.is_finite() { v } else { d };

        self.acceleration = finite_or(self.acceleration, defaults.acceleration).clamp(0.0, 0.1);
        self.clear_time = finite_or(self.clear_time, defaults.clear_time).clamp(0.0, 60_000.0);
        self.cloud_frequency = finite_or(self.cloud_frequency, defaults.cloud_frequency).clamp(0.0, 1.0);
        self.gameover_clear_time =
            finite_or(self.gameover_clear_time, defaults.gameover_clear_time).clamp(0.0, 10_000.0);
        self.gap_coefficient = finite_or(self.gap_coefficient, defaults.gap_coefficient).clamp(0.5, 5.0);
        self.gravity = finite_or(self.gravity, defaults.gravity).clamp(0.1, 5.0);
        self.initial_jump_velocity =
            finite_or(self.initial_jump_velocity, defaults.initial_jump_velocity).clamp(1.0, 30.0);
        self.max_clouds = self.max_clouds.clamp(1, 20);
        self.speed = finite_or(self.speed, defaults.speed).clamp(1.0, 30.0);
        self.max_speed = finite_or(self.max_speed, defaults.max_speed).clamp(self.speed, 30.0);
        self.mobile_speed_coefficient =
            finite_or(self.mobile_speed_coefficient, defaults.mobile_speed_coefficient).clamp(1.0, 3.0);
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            defaults.volume
        };
        self
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "rex_runner_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
        {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded runner config from LocalStorage");
                    return config.sanitized();
                }
                Err(e) => log::warn!("Ignoring stored config: {}", e),
            }
        }

        log::info!("Using default runner config");
        Self::default()
    }

    /// Native: `REX_RUNNER_CONFIG` names a JSON file, otherwise defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var("REX_RUNNER_CONFIG") else {
            return Self::default();
        };
        match Self::load_file(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded runner config from {}", path);
                config.sanitized()
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }
}

/// Errors that can occur when loading a runner configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(Option<PathBuf>, serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(Some(path), e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            ConfigError::Parse(None, e) => write!(f, "Failed to parse runner config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = RunnerConfig::from_json(r#"{ "speed": 8.0, "gravity": 0.5 }"#).unwrap();
        assert_eq!(config.speed, 8.0);
        assert_eq!(config.gravity, 0.5);
        assert_eq!(config.max_speed, 12.0);
        assert_eq!(config.clear_time, 3000.0);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = RunnerConfig::from_json("{ speed: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(None, _)));
        assert!(err.to_string().starts_with("Failed to parse runner config"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RunnerConfig::load_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn test_sanitized_clamps_out_of_range_values() {
        let config = RunnerConfig {
            speed: 50.0,
            max_speed: 2.0,
            cloud_frequency: 3.0,
            gravity: f64::NAN,
            max_clouds: 0,
            volume: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.speed, 30.0);
        assert_eq!(config.max_speed, 30.0);
        assert_eq!(config.cloud_frequency, 1.0);
        assert_eq!(config.gravity, 0.6);
        assert_eq!(config.max_clouds, 1);
        assert_eq!(config.volume, 0.0);
    }

    #[test]
    fn test_defaults_survive_sanitizing() {
        assert_eq!(RunnerConfig::default().sanitized(), RunnerConfig::default());
    }
}
