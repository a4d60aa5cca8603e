//! One level instance
//!
//! Owns the physics world and the scene for a single attempt: prize on vines,
//! crocodile below, water at the bottom. The host feeds it touches and frame
//! ticks and drains the events it produces. A level never restarts itself; it
//! asks the director for a replacement through `LevelEvent::PresentLevel`.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::action::{Action, Cue, Texture};
use super::crocodile::{Crocodile, MouthState};
use super::outcome::{LevelOverLatch, Outcome, check_contact, check_water_line};
use super::physics::{BodyDesc, BodyId, Contact, PhysicsWorld, Shape, category};
use super::scene::{NodeId, NodeKind, Scene, layer};
use super::swipe::{Cut, Stroke, find_cuts};
use super::transition::{Transition, switch_to_new_level};
use super::vine::{Vine, VineDescriptor, VineId, load_vine_data};
use crate::audio::{BackgroundMusic, Haptic, SoundEffect};
use crate::consts::*;
use crate::error::{LevelError, Result};
use crate::settings::Settings;

/// Something the host should react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelEvent {
    Sound(SoundEffect),
    Haptic(Haptic),
    VineCut(VineId),
    Outcome(Outcome),
    /// Replace this level with a fresh one using the given transition
    PresentLevel(Transition),
}

/// The prize hanging from the vines
#[derive(Debug, Clone, Copy)]
pub struct Prize {
    pub node: NodeId,
    pub body: BodyId,
}

/// A single level instance
#[derive(Debug)]
pub struct Level {
    viewport: Vec2,
    world: PhysicsWorld,
    scene: Scene,
    prize: Prize,
    crocodile: Crocodile,
    vines: Vec<Vine>,
    /// Active touch stroke, if a finger is down
    stroke: Option<Stroke>,
    allow_multiple_cuts: bool,
    latch: LevelOverLatch,
    rng: Pcg32,
    /// Begin-contacts waiting for evaluation
    contacts: VecDeque<Contact>,
    events: Vec<LevelEvent>,
    elapsed: f32,
}

impl Level {
    /// Build a level from the vine data file named in `settings`
    pub fn load(
        viewport: Vec2,
        settings: &Settings,
        music: &mut BackgroundMusic,
        seed: u64,
    ) -> Result<Self> {
        let vines = load_vine_data(&settings.vine_data_file)?;
        Self::new(viewport, &vines, settings, music, seed)
    }

    /// Full level setup: physics, scenery, prize, vines, crocodile, audio
    pub fn new(
        viewport: Vec2,
        vine_data: &[VineDescriptor],
        settings: &Settings,
        music: &mut BackgroundMusic,
        seed: u64,
    ) -> Result<Self> {
        if vine_data.is_empty() {
            return Err(LevelError::NoVines);
        }
        for (index, descriptor) in vine_data.iter().enumerate() {
            descriptor.validate(index)?;
        }

        let mut world = PhysicsWorld::new(Vec2::new(0.0, GRAVITY * POINTS_PER_METER));
        world.speed = 1.0;
        let mut scene = Scene::new();
        let mut rng = Pcg32::seed_from_u64(seed);

        set_up_scenery(&mut scene, viewport);
        let prize = set_up_prize(&mut world, &mut scene, viewport);

        let mut vines = Vec::with_capacity(vine_data.len());
        for (id, descriptor) in vine_data.iter().enumerate() {
            let vine = Vine::build(id, descriptor, viewport, &mut world, &mut scene);
            vine.attach_to_prize(prize.body, &mut world, &mut scene);
            vines.push(vine);
        }

        let crocodile = Crocodile::spawn(viewport, &mut world, &mut scene);
        crocodile.animate_idle(&mut scene, &mut rng);

        music.load_once(&settings.background_music_file);
        music.ensure_playing();

        log::info!(
            "Level ready: {} vines, viewport {}x{}, seed {seed}",
            vines.len(),
            viewport.x,
            viewport.y
        );

        Ok(Self {
            viewport,
            world,
            scene,
            prize,
            crocodile,
            vines,
            stroke: None,
            allow_multiple_cuts: settings.can_cut_multiple_vines_at_once,
            latch: LevelOverLatch::default(),
            rng,
            contacts: VecDeque::new(),
            events: Vec::new(),
            elapsed: 0.0,
        })
    }

    // === Input ===

    /// Finger down: a new stroke may cut again
    pub fn touches_began(&mut self) {
        self.stroke = Some(Stroke::begin());
    }

    /// Finger dragged from `previous` to `current`
    pub fn touches_moved(&mut self, previous: Vec2, current: Vec2) {
        if self.latch.is_set() {
            return;
        }
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let cuts = find_cuts(
            stroke,
            self.allow_multiple_cuts,
            previous,
            current,
            &self.world,
            &self.scene,
            &self.vines,
        );
        for cut in cuts {
            self.snip(cut);
        }
    }

    /// Finger up
    pub fn touches_ended(&mut self) {
        self.stroke = None;
    }

    /// Cut one struck segment. A sample can strike several links of the same
    /// vine; only the first of them starts the fade and reports the vine cut.
    fn snip(&mut self, cut: Cut) {
        let Some(vine) = self.vines.get_mut(cut.vine) else {
            return;
        };
        let newly_cut = !vine.is_cut();
        vine.mark_cut();
        log::debug!("Vine {} cut at ({:.1}, {:.1})", cut.vine, cut.point.x, cut.point.y);

        // The struck link goes now, the rest of the rope fades out
        self.scene.remove(cut.node);
        self.world.remove_body(cut.body);
        if newly_cut {
            for node in self.scene.vine_segments(cut.vine) {
                self.scene.run(
                    node,
                    Action::sequence([
                        Action::FadeOut {
                            duration: VINE_FADE_DURATION,
                        },
                        Action::RemoveFromParent,
                    ]),
                );
            }
        }

        self.crocodile.react_to_cut(&mut self.scene, &mut self.rng);
        self.events.push(LevelEvent::Sound(SoundEffect::Slice));
        if newly_cut {
            self.events.push(LevelEvent::VineCut(cut.vine));
        }
    }

    // === Frame ===

    /// Advance one frame: water check, physics (contacts), then actions
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;

        if let Some(y) = self.prize_position().map(|p| p.y) {
            if check_water_line(&mut self.latch, y).is_some() {
                self.prize_splashed();
            }
        }

        let began = self.world.step(dt);
        self.contacts.extend(began);
        while let Some(contact) = self.contacts.pop_front() {
            self.did_begin_contact(&contact);
        }

        self.scene.sync_from(&self.world);
        let update = self.scene.advance(dt);
        for node in update.removed {
            if let Some(body) = node.body {
                self.world.remove_body(body);
            }
        }
        for cue in update.cues {
            match cue {
                Cue::PresentLevel(transition) => {
                    self.events.push(LevelEvent::PresentLevel(transition))
                }
            }
        }
    }

    /// Contact callback
    pub fn did_begin_contact(&mut self, contact: &Contact) {
        if check_contact(
            &mut self.latch,
            contact,
            self.crocodile.body,
            self.prize.body,
        )
        .is_some()
        {
            self.prize_eaten();
        }
    }

    fn prize_splashed(&mut self) {
        log::info!("Prize fell in the water after {:.2}s", self.elapsed);
        self.events.push(LevelEvent::Sound(SoundEffect::Splash));
        self.events.push(LevelEvent::Haptic(Haptic::Light));
        self.events.push(LevelEvent::Outcome(Outcome::Lost));
        switch_to_new_level(&mut self.scene, Transition::fade(TRANSITION_DURATION));
    }

    fn prize_eaten(&mut self) {
        log::info!("Crocodile ate the prize after {:.2}s", self.elapsed);
        self.scene.run(
            self.prize.node,
            Action::sequence([
                Action::ScaleTo {
                    scale: 0.0,
                    duration: PRIZE_SHRINK_DURATION,
                },
                Action::RemoveFromParent,
            ]),
        );
        self.crocodile.run_nom_nom(&mut self.scene, NOM_NOM_DELAY);
        self.events.push(LevelEvent::Sound(SoundEffect::NomNom));
        self.events.push(LevelEvent::Haptic(Haptic::Heavy));
        self.events.push(LevelEvent::Outcome(Outcome::Won));
        switch_to_new_level(&mut self.scene, Transition::doorway(TRANSITION_DURATION));
    }

    // === Queries ===

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_over(&self) -> bool {
        self.latch.is_set()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.latch.outcome()
    }

    pub fn prize(&self) -> Prize {
        self.prize
    }

    /// Prize position, `None` once it has been eaten
    pub fn prize_position(&self) -> Option<Vec2> {
        self.world.body(self.prize.body).map(|b| b.pos)
    }

    pub fn crocodile(&self) -> Crocodile {
        self.crocodile
    }

    pub fn mouth(&self) -> Option<MouthState> {
        self.crocodile.mouth(&self.scene)
    }

    pub fn vines(&self) -> &[Vine] {
        &self.vines
    }

    /// Segment nodes of a vine still in the scene
    pub fn remaining_segments(&self, vine: VineId) -> usize {
        self.scene.vine_segments(vine).len()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

fn set_up_scenery(scene: &mut Scene, viewport: Vec2) {
    scene.add(
        NodeKind::Background,
        Vec2::ZERO,
        layer::BACKGROUND,
        Texture::Background,
    );
    // Water band along the bottom edge, drawn over everything
    scene.add(
        NodeKind::Water,
        Vec2::new(viewport.x / 2.0, water_height(viewport) / 2.0),
        layer::FOREGROUND,
        Texture::Water,
    );
}

/// Height of the water band
pub fn water_height(viewport: Vec2) -> f32 {
    viewport.y * WATER_HEIGHT_FRACTION
}

fn set_up_prize(world: &mut PhysicsWorld, scene: &mut Scene, viewport: Vec2) -> Prize {
    let pos = Vec2::new(viewport.x * PRIZE_POSITION.0, viewport.y * PRIZE_POSITION.1);
    let body = world.add_body(
        BodyDesc::new(
            pos,
            Shape::Circle {
                radius: PRIZE_RADIUS,
            },
        )
        .density(PRIZE_DENSITY)
        .category(category::PRIZE)
        .collides_with(category::NONE),
    );
    let node = scene.add_with_body(NodeKind::Prize, pos, layer::PRIZE, Texture::Prize, body);
    Prize { node, body }
}
