//! Snip the Vine - a single vine-cutting physics level
//!
//! Core modules:
//! - `sim`: Level simulation (physics world, scene graph, actions, game rules)
//! - `game`: Director that owns the current level and swaps it on transitions
//! - `audio`: Sound/haptic cues and the shared background music handle
//! - `settings`: Game configuration
//! - `error`: Setup errors

pub mod audio;
pub mod error;
pub mod game;
pub mod settings;
pub mod sim;

pub use audio::{BackgroundMusic, Haptic, SoundEffect};
pub use error::{LevelError, Result};
pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default viewport (portrait phone, in points)
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 375.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 667.0;

    /// Physics: points per metre, gravity in m/s²
    pub const POINTS_PER_METER: f32 = 150.0;
    pub const GRAVITY: f32 = -9.8;
    /// Joint relaxation passes per step
    pub const SOLVER_ITERATIONS: u32 = 12;

    /// Level layout (fractions of the viewport)
    pub const WATER_HEIGHT_FRACTION: f32 = 0.2139;
    pub const PRIZE_POSITION: (f32, f32) = (0.5, 0.7);
    pub const CROCODILE_POSITION: (f32, f32) = (0.75, 0.33);

    /// Body sizes (points)
    pub const PRIZE_RADIUS: f32 = 28.0;
    pub const PRIZE_DENSITY: f32 = 0.5;
    pub const CROCODILE_HALF_EXTENTS: (f32, f32) = (55.0, 30.0);
    pub const VINE_HOLDER_RADIUS: f32 = 6.0;
    pub const VINE_SEGMENT_LENGTH: f32 = 14.0;
    pub const VINE_SEGMENT_HALF_WIDTH: f32 = 4.0;
    pub const VINE_SEGMENT_DENSITY: f32 = 0.1;
    /// Last vine link sits this far above the prize centre (fraction of prize height)
    pub const PRIZE_ATTACH_OFFSET: f32 = 0.1;

    /// Timings (seconds)
    pub const VINE_FADE_DURATION: f32 = 0.25;
    pub const PRIZE_SHRINK_DURATION: f32 = 0.08;
    pub const NOM_NOM_DELAY: f32 = 0.15;
    pub const IDLE_MOUTH_MIN: f32 = 2.0;
    pub const IDLE_MOUTH_MAX: f32 = 4.0;
    pub const LEVEL_TRANSITION_DELAY: f32 = 1.0;
    pub const TRANSITION_DURATION: f32 = 1.0;
}

/// Convert a fraction of the viewport into level coordinates
#[inline]
pub fn relative_to_viewport(rel: Vec2, viewport: Vec2) -> Vec2 {
    rel * viewport
}

/// Closest point to `point` on the segment `a..b`
#[inline]
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
