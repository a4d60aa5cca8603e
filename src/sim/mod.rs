//! Deterministic level simulation
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body and node ID)
//! - No rendering or platform dependencies

pub mod action;
pub mod crocodile;
pub mod level;
pub mod outcome;
pub mod physics;
pub mod scene;
pub mod swipe;
pub mod transition;
pub mod vine;

pub use action::{Action, Appearance, Cue, RunningAction, Texture};
pub use crocodile::{Crocodile, MouthState};
pub use level::{Level, LevelEvent, Prize};
pub use outcome::{LevelOverLatch, Outcome};
pub use physics::{BodyDesc, BodyId, Contact, PhysicsWorld, RayHit, Shape};
pub use scene::{NodeId, NodeKind, Scene, SceneNode};
pub use swipe::{Cut, Stroke, find_cuts};
pub use transition::Transition;
pub use vine::{Vine, VineDescriptor, VineId, load_vine_data, parse_vine_data};
