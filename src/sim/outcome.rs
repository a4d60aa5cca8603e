//! Win/lose decisions
//!
//! Two triggers can end a level: the prize dropping to the water line (checked
//! every frame) and the prize touching the crocodile (checked per contact).
//! Both go through the same latch, so whichever fires first wins and the level
//! never ends twice.

use super::physics::{BodyId, Contact};

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Prize reached the crocodile
    Won,
    /// Prize fell in the water
    Lost,
}

/// Set-once record of the level's outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelOverLatch {
    outcome: Option<Outcome>,
}

impl LevelOverLatch {
    pub fn is_set(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Record an outcome. Returns false (and changes nothing) if already set.
    pub fn try_set(&mut self, outcome: Outcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }
}

/// Water line in level coordinates
pub const WATER_LINE: f32 = 0.0;

/// Frame check: has the prize dropped into the water?
pub fn check_water_line(latch: &mut LevelOverLatch, prize_y: f32) -> Option<Outcome> {
    if latch.is_set() || prize_y > WATER_LINE {
        return None;
    }
    latch.try_set(Outcome::Lost).then_some(Outcome::Lost)
}

/// Contact check: is this the prize landing in the crocodile's mouth?
pub fn check_contact(
    latch: &mut LevelOverLatch,
    contact: &Contact,
    crocodile: BodyId,
    prize: BodyId,
) -> Option<Outcome> {
    if latch.is_set() || !contact.is_between(crocodile, prize) {
        return None;
    }
    latch.try_set(Outcome::Won).then_some(Outcome::Won)
}
