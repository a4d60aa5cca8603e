//! Crocodile mouth animation
//!
//! The mouth is either closed or open; every change is a texture swap on the
//! crocodile node. Two timelines drive it: an idle loop with a random beat and
//! a short chomp reaction that replaces whatever was running.

use glam::Vec2;
use rand::Rng;
use super::action::{Action, Texture};
use super::physics::{BodyDesc, BodyId, PhysicsWorld, Shape, category};
use super::scene::{NodeId, NodeKind, Scene, layer};
use crate::consts::*;

/// Mouth state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouthState {
    Closed,
    Open,
}

impl MouthState {
    pub fn texture(self) -> Texture {
        match self {
            MouthState::Closed => Texture::CrocMouthClosed,
            MouthState::Open => Texture::CrocMouthOpen,
        }
    }

    pub fn from_texture(texture: Texture) -> Option<Self> {
        match texture {
            Texture::CrocMouthClosed => Some(MouthState::Closed),
            Texture::CrocMouthOpen => Some(MouthState::Open),
            _ => None,
        }
    }
}

fn set_mouth(state: MouthState) -> Action {
    Action::SetTexture(state.texture())
}

/// Idle loop: wait, open, wait, close, forever (same beat for both waits)
pub fn idle_action(beat: f32) -> Action {
    Action::repeat_forever(Action::sequence([
        Action::Wait(beat),
        set_mouth(MouthState::Open),
        Action::Wait(beat),
        set_mouth(MouthState::Closed),
    ]))
}

/// Chomp: close now, open after `delay`, close again after another `delay`
pub fn nom_nom_action(delay: f32) -> Action {
    Action::sequence([
        set_mouth(MouthState::Closed),
        Action::Wait(delay),
        set_mouth(MouthState::Open),
        Action::Wait(delay),
        set_mouth(MouthState::Closed),
    ])
}

/// Random idle beat in [IDLE_MOUTH_MIN, IDLE_MOUTH_MAX)
pub fn idle_beat(rng: &mut impl Rng) -> f32 {
    rng.random_range(IDLE_MOUTH_MIN..IDLE_MOUTH_MAX)
}

/// The crocodile: a static contact sensor with an animated mouth
#[derive(Debug, Clone, Copy)]
pub struct Crocodile {
    pub node: NodeId,
    pub body: BodyId,
}

impl Crocodile {
    pub fn spawn(viewport: Vec2, world: &mut PhysicsWorld, scene: &mut Scene) -> Self {
        let pos = Vec2::new(
            viewport.x * CROCODILE_POSITION.0,
            viewport.y * CROCODILE_POSITION.1,
        );
        let body = world.add_body(
            BodyDesc::new(
                pos,
                Shape::Rect {
                    half_extents: Vec2::new(CROCODILE_HALF_EXTENTS.0, CROCODILE_HALF_EXTENTS.1),
                },
            )
            .fixed()
            .category(category::CROCODILE)
            .contacts_with(category::PRIZE),
        );
        let node = scene.add_with_body(
            NodeKind::Crocodile,
            pos,
            layer::CROCODILE,
            MouthState::Closed.texture(),
            body,
        );
        Self { node, body }
    }

    pub fn mouth(&self, scene: &Scene) -> Option<MouthState> {
        scene
            .node(self.node)
            .and_then(|n| MouthState::from_texture(n.appearance.texture))
    }

    /// (Re)start the idle loop with a fresh random beat
    pub fn animate_idle(&self, scene: &mut Scene, rng: &mut impl Rng) {
        scene.run(self.node, idle_action(idle_beat(rng)));
    }

    /// Cancel the idle loop and run the chomp. The idle loop is not resumed.
    pub fn run_nom_nom(&self, scene: &mut Scene, delay: f32) {
        scene.remove_all_actions(self.node);
        if let Some(node) = scene.node_mut(self.node) {
            node.appearance.texture = MouthState::Closed.texture();
        }
        scene.run(self.node, nom_nom_action(delay));
    }

    /// A vine was cut: snap the mouth open and restart idling
    pub fn react_to_cut(&self, scene: &mut Scene, rng: &mut impl Rng) {
        scene.remove_all_actions(self.node);
        if let Some(node) = scene.node_mut(self.node) {
            node.appearance.texture = MouthState::Open.texture();
        }
        self.animate_idle(scene, rng);
    }
}
