use serde::{Deserialize, Serialize};

use super::host::PrimitiveKind;
use super::trajectory::IMPULSE_JITTER_MAX;
use crate::error::{ExploderError, Result};

/// How launch directions are distributed around the vertical axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMode {
    /// Angle from index, vertical component drawn from `[2, 5]`
    #[default]
    Simple,
    /// Evenly spaced angles, jittered impulse, configurable vertical spread
    Radial,
    /// Particles stay at the origin
    Static,
}

/// Exploder settings
///
/// Loaded once before the pool is allocated, either from the Godot
/// inspector or from a JSON document:
/// ```json
/// {"pool_size": 64, "gravity": -9.8, "direction_mode": "radial"}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploderConfig {
    pub pool_size: usize,
    /// Vertical acceleration, negative pulls down
    pub gravity: f32,
    pub speed: f32,
    /// Horizontal launch bias, radial mode only
    pub impulse: f32,
    /// `[min, max]` of the vertical launch component, radial mode only
    pub vertical_spread: [f32; 2],
    pub direction_mode: DirectionMode,
    /// Reproduce the index-to-angle truncation of the first exploder
    /// (simple mode only). Almost every particle gets angle 0.
    pub legacy_angles: bool,
    pub primitive: PrimitiveKind,
}

impl Default for ExploderConfig {
    fn default() -> Self {
        Self {
            pool_size: 32,
            gravity: -9.8,
            speed: 3.0,
            impulse: 1.0,
            vertical_spread: [2.0, 5.0],
            direction_mode: DirectionMode::Simple,
            legacy_angles: false,
            primitive: PrimitiveKind::Cube,
        }
    }
}

impl ExploderConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject settings that would produce NaN positions or an empty range
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gravity", self.gravity),
            ("speed", self.speed),
            ("impulse", self.impulse),
            ("vertical_spread.min", self.vertical_spread[0]),
            ("vertical_spread.max", self.vertical_spread[1]),
        ] {
            if !value.is_finite() {
                return Err(ExploderError::InvalidArgument(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if self.impulse < 0.0 {
            return Err(ExploderError::InvalidArgument(format!(
                "impulse must not be negative, got {}",
                self.impulse
            )));
        }
        if !(self.impulse * IMPULSE_JITTER_MAX).is_finite() {
            return Err(ExploderError::InvalidArgument(format!(
                "impulse {} overflows once jittered",
                self.impulse
            )));
        }
        let [min, max] = self.vertical_spread;
        if min > max {
            return Err(ExploderError::InvalidArgument(format!(
                "vertical_spread min {} exceeds max {}",
                min, max
            )));
        }
        // The sampler needs the width of the range to be representable
        if !(max - min).is_finite() {
            return Err(ExploderError::InvalidArgument(format!(
                "vertical_spread [{}, {}] is too wide",
                min, max
            )));
        }
        Ok(())
    }

    /// True when both configs draw launch directions the same way
    pub fn same_launch_distribution(&self, other: &Self) -> bool {
        self.direction_mode == other.direction_mode
            && self.impulse == other.impulse
            && self.vertical_spread == other.vertical_spread
            && self.legacy_angles == other.legacy_angles
    }
}

/// Convert a pool size coming from a signed host integer
pub fn pool_size_from_signed(pool_size: i64) -> Result<usize> {
    usize::try_from(pool_size).map_err(|_| {
        ExploderError::InvalidArgument(format!("pool size must not be negative, got {}", pool_size))
    })
}

/// Convert a pool size for a host that stores it as a 32-bit signed integer
pub fn pool_size_to_signed(pool_size: usize) -> Result<i32> {
    i32::try_from(pool_size).map_err(|_| {
        ExploderError::InvalidArgument(format!("pool size {} does not fit a 32-bit int", pool_size))
    })
}
