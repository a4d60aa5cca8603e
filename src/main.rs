//! Snip the Vine entry point
//!
//! Headless host: loads settings, starts a game, then plays it with scripted
//! swipes and logs every event. Rendering and real input belong to whatever
//! embeds the library.

use glam::Vec2;

use snip_the_vine::consts::*;
use snip_the_vine::sim::LevelEvent;
use snip_the_vine::{Game, Settings};

/// Give up on a level after this many seconds without a switch
const DEMO_TIMEOUT: f32 = 30.0;
/// Seconds between scripted swipes
const SWIPE_INTERVAL: f32 = 0.75;

fn main() {
    env_logger::init();
    log::info!("Snip the Vine (headless) starting...");

    let settings = Settings::load("settings.json");
    let viewport = Vec2::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT);
    let mut game = match Game::new(settings, viewport) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Level setup failed: {e}");
            std::process::exit(1);
        }
    };

    let music = game.music();
    log::info!(
        "Background music {} (volume {:.2})",
        if music.is_playing() { "playing" } else { "off" },
        music.volume()
    );

    if let Err(e) = play_one_level(&mut game) {
        log::error!("Level setup failed: {e}");
        std::process::exit(1);
    }
}

/// Swipe across one vine at a time until the level is replaced
fn play_one_level(game: &mut Game) -> snip_the_vine::Result<()> {
    let mut time = 0.0;
    let mut next_swipe = SWIPE_INTERVAL;
    let mut swipe_height = viewport_swipe_height(game.viewport());

    while time < DEMO_TIMEOUT {
        if time >= next_swipe && !game.level().is_over() {
            swipe(game, swipe_height);
            swipe_height -= VINE_SEGMENT_LENGTH;
            next_swipe += SWIPE_INTERVAL;
        }

        for event in game.frame(SIM_DT)? {
            match event {
                LevelEvent::PresentLevel(transition) => {
                    log::info!(
                        "Level {} presented ({})",
                        game.levels_presented(),
                        transition.name()
                    );
                    return Ok(());
                }
                other => log::info!("{time:6.2}s  {other:?}"),
            }
        }
        time += SIM_DT;
    }

    log::warn!("No level switch after {DEMO_TIMEOUT}s");
    Ok(())
}

/// A height just below the vine holders
fn viewport_swipe_height(viewport: Vec2) -> f32 {
    viewport.y * 0.9
}

/// One left-to-right stroke across the whole viewport
fn swipe(game: &mut Game, y: f32) {
    let width = game.viewport().x;
    let steps = 8;
    game.touches_began();
    for i in 0..steps {
        let from = Vec2::new(width * i as f32 / steps as f32, y);
        let to = Vec2::new(width * (i + 1) as f32 / steps as f32, y);
        game.touches_moved(from, to);
    }
    game.touches_ended();
}
