//! Level director
//!
//! Owns the current level and the long-lived resources around it (settings,
//! background music). Host frames are turned into fixed-timestep level ticks;
//! when a level asks for a replacement the director builds a brand new one of
//! the same size.

use std::path::PathBuf;

use glam::Vec2;

use crate::audio::BackgroundMusic;
use crate::consts::*;
use crate::error::Result;
use crate::settings::Settings;
use crate::sim::level::{Level, LevelEvent};
use crate::sim::transition::Transition;
use crate::sim::vine::{VineDescriptor, load_vine_data};

/// Where each new level gets its vines from
#[derive(Debug, Clone)]
enum VineSource {
    /// Re-read on every level setup
    File(PathBuf),
    Fixed(Vec<VineDescriptor>),
}

/// Game instance holding the current level
#[derive(Debug)]
pub struct Game {
    settings: Settings,
    viewport: Vec2,
    vine_source: VineSource,
    music: BackgroundMusic,
    level: Level,
    accumulator: f32,
    /// Levels built so far, including the current one
    levels: u64,
    last_transition: Option<Transition>,
    base_seed: u64,
}

impl Game {
    /// Start a game whose levels load vines from `settings.vine_data_file`
    pub fn new(settings: Settings, viewport: Vec2) -> Result<Self> {
        let source = VineSource::File(settings.vine_data_file.clone());
        Self::with_source(settings, viewport, source)
    }

    /// Start a game with a fixed vine layout
    pub fn with_vines(
        settings: Settings,
        viewport: Vec2,
        vines: Vec<VineDescriptor>,
    ) -> Result<Self> {
        Self::with_source(settings, viewport, VineSource::Fixed(vines))
    }

    fn with_source(settings: Settings, viewport: Vec2, vine_source: VineSource) -> Result<Self> {
        let mut music = BackgroundMusic::new();
        music.set_volume(settings.music_volume);
        let base_seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Starting game (seed {base_seed})");

        let level = build_level(&vine_source, viewport, &settings, &mut music, base_seed)?;
        Ok(Self {
            settings,
            viewport,
            vine_source,
            music,
            level,
            accumulator: 0.0,
            levels: 1,
            last_transition: None,
            base_seed,
        })
    }

    /// Run simulation ticks for one host frame and return what happened.
    ///
    /// Setup of a replacement level can fail (bad vine data); that error is
    /// fatal for the game.
    pub fn frame(&mut self, dt: f32) -> Result<Vec<LevelEvent>> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.level.update(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in self.level.drain_events() {
                if let LevelEvent::PresentLevel(transition) = event {
                    self.present_new_level(transition)?;
                }
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Replace the current level with a fresh one of the same size
    fn present_new_level(&mut self, transition: Transition) -> Result<()> {
        let seed = self.base_seed.wrapping_add(self.levels);
        self.level = build_level(
            &self.vine_source,
            self.viewport,
            &self.settings,
            &mut self.music,
            seed,
        )?;
        self.levels += 1;
        self.last_transition = Some(transition);
        log::info!(
            "Presented level {} with {} transition ({:.1}s)",
            self.levels,
            transition.name(),
            transition.duration()
        );
        Ok(())
    }

    // === Input forwarding ===

    pub fn touches_began(&mut self) {
        self.level.touches_began();
    }

    pub fn touches_moved(&mut self, previous: Vec2, current: Vec2) {
        self.level.touches_moved(previous, current);
    }

    pub fn touches_ended(&mut self) {
        self.level.touches_ended();
    }

    // === Queries ===

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// How many levels have been presented, counting the first
    pub fn levels_presented(&self) -> u64 {
        self.levels
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    pub fn music(&self) -> &BackgroundMusic {
        &self.music
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
}

fn build_level(
    source: &VineSource,
    viewport: Vec2,
    settings: &Settings,
    music: &mut BackgroundMusic,
    seed: u64,
) -> Result<Level> {
    match source {
        VineSource::File(path) => {
            let vines = load_vine_data(path)?;
            Level::new(viewport, &vines, settings, music, seed)
        }
        VineSource::Fixed(vines) => Level::new(viewport, vines, settings, music, seed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LevelError;
    use crate::sim::outcome::Outcome;

    const VIEWPORT: Vec2 = Vec2::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT);

    fn test_settings() -> Settings {
        Settings {
            seed: Some(3),
            background_music_file: "no/such/music.caf".into(),
            ..Default::default()
        }
    }

    fn test_game() -> Game {
        let vines = vec![
            VineDescriptor {
                length: 18,
                rel_anchor_point: Vec2::new(0.5, 0.945),
            },
            VineDescriptor {
                length: 15,
                rel_anchor_point: Vec2::new(0.85, 0.945),
            },
        ];
        Game::with_vines(test_settings(), VIEWPORT, vines).unwrap()
    }

    /// Frames of exactly one tick each until `done` or `limit` ticks pass
    fn run_until(
        game: &mut Game,
        limit: usize,
        mut done: impl FnMut(&LevelEvent) -> bool,
    ) -> Vec<LevelEvent> {
        let mut seen = Vec::new();
        for _ in 0..limit {
            let events = game.frame(SIM_DT).unwrap();
            let finished = events.iter().any(&mut done);
            seen.extend(events);
            if finished {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_missing_vine_data_is_fatal() {
        let settings = Settings {
            vine_data_file: "no/such/VineData.json".into(),
            ..test_settings()
        };
        assert!(matches!(
            Game::new(settings, VIEWPORT),
            Err(LevelError::Io { .. })
        ));
    }

    #[test]
    fn test_frame_clamps_long_frames() {
        let mut game = test_game();
        game.frame(10.0).unwrap();
        // dt is clamped to 0.1s, so at most six ticks run
        let elapsed = game.level().elapsed();
        assert!(elapsed > 4.5 * SIM_DT);
        assert!(elapsed < 6.5 * SIM_DT);

        let mut game = test_game();
        game.frame(SIM_DT * 0.5).unwrap();
        assert_eq!(game.level().elapsed(), 0.0);
        game.frame(SIM_DT * 0.5).unwrap();
        assert!(game.level().elapsed() > 0.0);
    }

    #[test]
    fn test_lost_level_is_replaced_after_a_second() {
        let mut game = test_game();
        let prize = game.level().prize().body;
        game.level
            .world_mut()
            .set_position(prize, Vec2::new(50.0, -1.0));

        let events = run_until(&mut game, 120, |e| matches!(e, LevelEvent::PresentLevel(_)));
        assert!(events.contains(&LevelEvent::Outcome(Outcome::Lost)));
        assert!(events.contains(&LevelEvent::PresentLevel(Transition::fade(1.0))));

        assert_eq!(game.levels_presented(), 2);
        assert_eq!(game.last_transition(), Some(Transition::fade(1.0)));
        let fresh = game.level();
        assert!(!fresh.is_over());
        assert!(fresh.vines().iter().all(|v| !v.is_cut()));
        assert_eq!(fresh.viewport(), VIEWPORT);
    }

    #[test]
    fn test_won_level_is_replaced_with_doorway() {
        let mut game = test_game();
        let contact = crate::sim::physics::Contact {
            body_a: game.level().crocodile().body,
            body_b: game.level().prize().body,
            point: Vec2::ZERO,
        };
        game.level.did_begin_contact(&contact);

        run_until(&mut game, 120, |e| matches!(e, LevelEvent::PresentLevel(_)));
        assert_eq!(game.levels_presented(), 2);
        assert_eq!(game.last_transition(), Some(Transition::doorway(1.0)));
    }

    #[test]
    fn test_one_outcome_and_one_switch_per_level() {
        let mut game = test_game();
        let prize = game.level().prize().body;
        game.level
            .world_mut()
            .set_position(prize, Vec2::new(50.0, -1.0));

        let events = run_until(&mut game, 70, |_| false);
        let outcomes = events
            .iter()
            .filter(|e| matches!(e, LevelEvent::Outcome(_)))
            .count();
        let switches = events
            .iter()
            .filter(|e| matches!(e, LevelEvent::PresentLevel(_)))
            .count();
        assert_eq!(outcomes, 1);
        assert_eq!(switches, 1);
    }

    #[test]
    fn test_touches_reach_the_level() {
        let mut game = test_game();
        game.touches_began();
        game.touches_moved(Vec2::new(0.0, 602.0), Vec2::new(VIEWPORT.x, 602.0));
        game.touches_ended();
        assert_eq!(game.level().vines().iter().filter(|v| v.is_cut()).count(), 1);
    }

    #[test]
    fn test_missing_music_does_not_stop_the_game() {
        let game = test_game();
        assert!(!game.music().is_loaded());
        assert!(!game.music().is_playing());
    }
}
