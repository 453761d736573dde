//! Motion settings
//!
//! Defines the executor configuration and the profile bundle loaded by
//! embedding applications.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, ScreenPoint};
use crate::noise::NoiseModel;
use crate::profile::{MotionProfile, ProfileError};
use crate::stealth::HumanizeConfig;

/// Failure to build a usable configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid motion profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("Addressable bounds {0:?} have no area")]
    EmptyBounds(Rect),
    #[error("Start position {position:?} outside bounds {bounds:?}")]
    StartOutOfBounds { position: ScreenPoint, bounds: Rect },
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Addressable area of the target application; every emitted point lies inside
    pub bounds: Rect,
    /// Noise pipeline variant
    pub noise_model: NoiseModel,
    /// Which imperfections are allowed
    pub humanize: HumanizeConfig,
    /// Initial cursor position, the bounds midpoint when unset
    pub start_position: Option<ScreenPoint>,
    /// Fixed RNG seed for reproducible runs; OS entropy when unset
    pub seed: Option<u64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::default(),
            noise_model: NoiseModel::Resonant,
            humanize: HumanizeConfig::default(),
            start_position: None,
            seed: None,
        }
    }
}

impl MotionConfig {
    /// Default behavior over a `width` x `height` screen
    pub fn for_screen(width: i32, height: i32) -> Self {
        Self {
            bounds: Rect::new(0, 0, width, height),
            ..Default::default()
        }
    }

    /// Seeded configuration for replayable traces
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Bandwidth-only noise, for hosts where the resonant pipeline is unwanted
    pub fn fallback_noise() -> Self {
        Self {
            noise_model: NoiseModel::BandwidthOnly,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse `json`, logging and falling back to defaults on failure
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to parse motion config: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.is_degenerate() {
            return Err(ConfigError::EmptyBounds(self.bounds));
        }
        if let Some(position) = self.start_position {
            if !self.bounds.contains(position) {
                return Err(ConfigError::StartOutOfBounds {
                    position,
                    bounds: self.bounds,
                });
            }
        }
        Ok(())
    }

    /// Where the cursor starts
    pub fn initial_position(&self) -> ScreenPoint {
        self.start_position.unwrap_or_else(|| self.bounds.midpoint())
    }
}

/// Configuration and individual profile, as stored by an embedding application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion: MotionConfig,
    pub profile: MotionProfile,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.motion.validate()?;
        settings.profile.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
