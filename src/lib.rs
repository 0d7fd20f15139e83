//! Vault Guardian - an arcade vault defense game
//!
//! Core modules:
//! - `sim`: Simulation core (entities, spawner, collisions, weapons, scoring, game loop)
//! - `config`: Data-driven game balance with an embedded default document
//! - `highscores`: Persisted top-N leaderboard
//! - `platform`: Browser/native platform abstraction (time, logging, storage)

pub mod config;
pub mod highscores;
pub mod platform;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use highscores::HighScores;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Maximum frame delta (seconds); longer stalls are clamped to this
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Base sizes are authored for a 1080px short screen edge
    pub const REFERENCE_EXTENT: f32 = 1080.0;

    /// Pickup defaults
    pub const PICKUP_RADIUS: f32 = 20.0;
    pub const PICKUP_HP: i32 = 2;
    pub const PICKUP_DRIFT_SPEED: f32 = 18.0;
    pub const PICKUP_EDGE_PADDING: f32 = 30.0;

    /// Projectile defaults
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    /// Projectiles further than this outside the screen are discarded
    pub const PROJECTILE_BOUNDS_MARGIN: f32 = 50.0;

    /// Laser defaults
    pub const LASER_DURATION: f32 = 2.5;
    pub const LASER_WIDTH: f32 = 6.0;

    /// Wave ring defaults
    pub const RING_START_RADIUS: f32 = 20.0;
    pub const RING_SPEED: f32 = 350.0;
    pub const RING_THICKNESS: f32 = 15.0;
    /// Ring max radius as a fraction of the longer screen edge
    pub const RING_REACH: f32 = 0.7;

    /// Transient timers (seconds)
    pub const HIT_FLASH: f32 = 0.12;
    pub const LASER_HIT_FLASH: f32 = 0.15;
    pub const SHIELD_FLASH: f32 = 0.3;

    /// Threats reach the vault with half their radius
    pub const VAULT_REACH: f32 = 0.5;
    /// Threat visual spin (radians/sec)
    pub const THREAT_SPIN_RATE: f32 = 1.5;

    /// Weapon patterns
    pub const TWIN_SPREAD: f32 = 0.08; // ~4.5 degrees
    pub const STREAM_COOLDOWN: f32 = 0.06; // ~16 shots/sec
    pub const SPREAD_SHOTS: usize = 7;
    pub const SPREAD_HALF_ANGLE: f32 = 0.35; // ~20 degrees each side
    pub const SPREAD_SPEED_JITTER: f32 = 0.3;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of the vector pointing from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
