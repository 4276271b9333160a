//! Rex Runner - an endless side-scrolling runner
//!
//! Core modules:
//! - `sim`: Runner simulation (character physics, obstacles, scoring, game loop)
//! - `renderer`: Drawing sink the simulation paints into
//! - `platform`: Host abstraction (clock, frame scheduling, sound) plus headless/browser hosts
//! - `audio`: Sound effect identifiers and Web Audio playback
//! - `settings`: Data-driven runner tuning
//! - `relay`: Actor/controller message forwarding for the remote jump controller

pub mod audio;
pub mod platform;
pub mod relay;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use audio::SoundEffect;
pub use settings::{ConfigError, RunnerConfig};
pub use sim::Runner;

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Reference frame rate every per-frame quantity is expressed against
    pub const FPS: f64 = 60.0;
    /// Milliseconds per reference frame
    pub const MS_PER_FRAME: f64 = 1000.0 / FPS;

    /// Default surface dimensions (the sprite sheet is laid out for these)
    pub const DEFAULT_WIDTH: i32 = 600;
    pub const DEFAULT_HEIGHT: i32 = 150;

    /// Distance between the ground line and the bottom of the surface
    pub const BOTTOM_PAD: i32 = 10;

    /// Remote controller jump velocity bounds
    pub const MIN_REMOTE_JUMP_VELOCITY: f64 = 8.0;
    pub const MAX_REMOTE_JUMP_VELOCITY: f64 = 16.0;
}

/// Round half toward positive infinity, the way browser `Math.round` does.
///
/// `f64::round` rounds half away from zero, which shifts upward jump steps
/// (negative velocities) by a pixel on exact halves.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Random integer in `[min, max]` (inclusive). Collapses to `min` on an empty range.
#[inline]
pub fn random_num<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}
