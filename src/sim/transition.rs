//! Level transition sequencing
//!
//! A finished level schedules one delayed cue on its root node; the director
//! answers the cue by building a fresh level. Nothing here guards against a
//! second schedule, the level-over latch upstream does that.

use super::action::{Action, Cue};
use super::scene::Scene;
use crate::consts::LEVEL_TRANSITION_DELAY;

/// Visual effect used when presenting the next level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Cross-fade (after a lose)
    Fade { duration: f32 },
    /// Doors opening onto the new level (after a win)
    Doorway { duration: f32 },
}

impl Transition {
    pub fn fade(duration: f32) -> Self {
        Transition::Fade { duration }
    }

    pub fn doorway(duration: f32) -> Self {
        Transition::Doorway { duration }
    }

    /// How long the effect itself plays; unrelated to the switch delay
    pub fn duration(&self) -> f32 {
        match *self {
            Transition::Fade { duration } | Transition::Doorway { duration } => duration,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Fade { .. } => "fade",
            Transition::Doorway { .. } => "doorway",
        }
    }
}

/// The action that switches levels: wait a fixed second, then ask for a new one
pub fn switch_level_action(transition: Transition) -> Action {
    Action::sequence([
        Action::Wait(LEVEL_TRANSITION_DELAY),
        Action::Run(Cue::PresentLevel(transition)),
    ])
}

/// Schedule the switch on the scene root
pub fn switch_to_new_level(scene: &mut Scene, transition: Transition) {
    log::info!(
        "Switching level in {LEVEL_TRANSITION_DELAY}s ({} transition)",
        transition.name()
    );
    let root = scene.root();
    scene.run(root, switch_level_action(transition));
}
