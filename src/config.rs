// Engine configuration - Scheduling, envelope and capacity settings
// Loaded from RON (default) or JSON files

use crate::sequencer::PlaybackMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
///
/// All durations are seconds unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_bpm: f64,
    pub steps_per_beat: u32,
    pub beats_per_bar: u32,

    /// How far ahead of the clock steps are committed to the voice backend
    pub lookahead_secs: f64,
    /// Sleep between scheduling passes of the driver thread
    pub tick_interval_ms: u64,
    /// Gap between `start()` and the first step
    pub start_delay_secs: f64,

    pub adaptive_lookahead: bool,
    pub min_lookahead_secs: f64,
    pub max_lookahead_secs: f64,

    /// Minimum attack ramp of every voice
    pub attack_secs: f64,
    /// Minimum release ramp of every voice
    pub release_secs: f64,
    /// Fade applied to sounding voices on stop/pause
    pub stop_fade_secs: f64,
    /// Delay after a voice's stop time before it is torn down
    pub teardown_margin_secs: f64,

    pub max_voices: usize,
    pub voice_queue_capacity: usize,
    pub notification_capacity: usize,

    pub playback_mode: PlaybackMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_bpm: 120.0,
            steps_per_beat: 4,
            beats_per_bar: 4,
            lookahead_secs: 0.1,
            tick_interval_ms: 25,
            start_delay_secs: 0.0,
            adaptive_lookahead: false,
            min_lookahead_secs: 0.05,
            max_lookahead_secs: 0.5,
            attack_secs: 0.005,
            release_secs: 0.005,
            stop_fade_secs: 0.01,
            teardown_margin_secs: 1.0,
            max_voices: 64,
            voice_queue_capacity: 512,
            notification_capacity: 1024,
            playback_mode: PlaybackMode::Loop,
        }
    }
}

impl EngineConfig {
    /// Load from a `.ron` or `.json` file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = match extension(path).as_str() {
            "ron" => ron::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match extension(path).as_str() {
            "ron" => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, v)))
            }
        };
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be >= 0, got {}", name, v)))
            }
        };

        positive("default_bpm", self.default_bpm)?;
        positive("lookahead_secs", self.lookahead_secs)?;
        positive("min_lookahead_secs", self.min_lookahead_secs)?;
        positive("max_lookahead_secs", self.max_lookahead_secs)?;
        positive("attack_secs", self.attack_secs)?;
        positive("release_secs", self.release_secs)?;
        positive("stop_fade_secs", self.stop_fade_secs)?;
        non_negative("start_delay_secs", self.start_delay_secs)?;
        non_negative("teardown_margin_secs", self.teardown_margin_secs)?;

        if self.steps_per_beat == 0 || self.beats_per_bar == 0 {
            return Err(ConfigError::Invalid(
                "steps_per_beat and beats_per_bar must be non-zero".to_string(),
            ));
        }
        if self.min_lookahead_secs > self.max_lookahead_secs {
            return Err(ConfigError::Invalid(format!(
                "lookahead bounds inverted: {} > {}",
                self.min_lookahead_secs, self.max_lookahead_secs
            )));
        }
        if self.max_voices == 0 || self.voice_queue_capacity == 0 || self.notification_capacity == 0
        {
            return Err(ConfigError::Invalid("capacities must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn steps_per_bar(&self) -> u32 {
        self.steps_per_beat * self.beats_per_bar
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(EngineConfig::default().steps_per_bar(), 16);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EngineConfig {
            default_bpm: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EngineConfig {
            min_lookahead_secs: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            steps_per_beat: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_ron() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig {
            default_bpm: 96.0,
            playback_mode: PlaybackMode::Continuous,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "default_bpm": 140.0, "max_voices": 8 }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.default_bpm, 140.0);
        assert_eq!(config.max_voices, 8);
        assert_eq!(config.lookahead_secs, 0.1);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
