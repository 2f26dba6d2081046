//! Launch directions and the closed-form particle trajectory.
//!
//! Positions are never integrated frame by frame. Every update evaluates
//!
//! ```text
//! acceleration = UP * (0.5 * g * t²)
//! velocity     = direction * (s * t)
//! position     = origin + velocity + acceleration
//! ```
//!
//! for the current elapsed time, so a particle lands in the same spot no
//! matter how the frame deltas were sliced.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use super::config::{DirectionMode, ExploderConfig};

/// Vertical launch component range of the simple mode
pub const SIMPLE_VERTICAL_MIN: f32 = 2.0;
pub const SIMPLE_VERTICAL_MAX: f32 = 5.0;

/// Index divisor of the legacy angle rule
const LEGACY_ANGLE_STEP: usize = 180;

/// Impulse jitter, ±50%
pub(crate) const IMPULSE_JITTER_MIN: f32 = 0.5;
pub(crate) const IMPULSE_JITTER_MAX: f32 = 1.5;

/// Horizontal angle of particle `index` when `pool_size` particles share a full circle
pub fn even_angle(index: usize, pool_size: usize) -> f32 {
    if pool_size == 0 {
        return 0.0;
    }
    index as f32 * (TAU / pool_size as f32)
}

/// Compute the launch direction of particle `index`.
///
/// Simple and radial directions are unit length; static particles get
/// `Vec3::ZERO` because they never move.
pub fn launch_direction<R: Rng + ?Sized>(config: &ExploderConfig, index: usize, rng: &mut R) -> Vec3 {
    match config.direction_mode {
        DirectionMode::Simple => {
            let y = rng.random_range(SIMPLE_VERTICAL_MIN..=SIMPLE_VERTICAL_MAX);
            let raw = if config.legacy_angles {
                // Integer division first: every particle below index 180 gets 0
                let theta = (index / LEGACY_ANGLE_STEP) as f32 * TAU;
                log::trace!("[EXPLODER] legacy angle for particle {}: {}", index, theta);
                Vec3::new(theta.cos(), y, theta.cos())
            } else {
                let theta = even_angle(index, config.pool_size);
                Vec3::new(theta.cos(), y, theta.sin())
            };
            normalize_or_up(raw)
        }
        DirectionMode::Radial => {
            let theta = even_angle(index, config.pool_size);
            let horizontal = config.impulse * rng.random_range(IMPULSE_JITTER_MIN..=IMPULSE_JITTER_MAX);
            let [min, max] = config.vertical_spread;
            let y = rng.random_range(min..=max);
            normalize_or_up(Vec3::new(theta.cos() * horizontal, y, theta.sin() * horizontal))
        }
        DirectionMode::Static => Vec3::ZERO,
    }
}

/// Ballistic displacement from `origin` after `t` seconds
pub fn ballistic_position(origin: Vec3, direction: Vec3, t: f32, gravity: f32, speed: f32) -> Vec3 {
    let acceleration = Vec3::Y * (0.5 * gravity * t * t);
    let velocity = direction * (speed * t);
    origin + velocity + acceleration
}

/// Position of a particle under the configured mode
pub fn position_at(config: &ExploderConfig, origin: Vec3, direction: Vec3, t: f32) -> Vec3 {
    match config.direction_mode {
        DirectionMode::Static => origin,
        DirectionMode::Simple | DirectionMode::Radial => {
            ballistic_position(origin, direction, t, config.gravity, config.speed)
        }
    }
}

// A zero raw vector only happens with zero impulse and a spread pinned at 0
fn normalize_or_up(raw: Vec3) -> Vec3 {
    raw.try_normalize().unwrap_or(Vec3::Y)
}
