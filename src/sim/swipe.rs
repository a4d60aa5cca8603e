//! Swipe-to-cut detection
//!
//! Each drag sample becomes a segment cast through the physics world. Vine
//! segments crossed by the cast are cut, subject to the one-cut-per-stroke
//! rule unless multi-cut is enabled.

use glam::Vec2;

use super::physics::{BodyId, PhysicsWorld};
use super::scene::{NodeId, Scene};
use super::vine::{Vine, VineId};

/// One finger-down to finger-up drag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stroke {
    /// Has this stroke already cut a vine?
    pub has_cut: bool,
}

impl Stroke {
    pub fn begin() -> Self {
        Self::default()
    }
}

/// A vine segment chosen for cutting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    pub vine: VineId,
    pub node: NodeId,
    pub body: BodyId,
    /// Where the swipe crossed the segment
    pub point: Vec2,
}

/// Segments to cut for one drag sample, in cast order.
///
/// Every body the cast crosses counts against the stroke, vine or not: once
/// `stroke.has_cut` is set and `allow_multiple` is off, the rest of the stroke
/// cuts nothing. Segments of vines already cut are crossed but never cut.
pub fn find_cuts(
    stroke: &mut Stroke,
    allow_multiple: bool,
    previous: Vec2,
    current: Vec2,
    world: &PhysicsWorld,
    scene: &Scene,
    vines: &[Vine],
) -> Vec<Cut> {
    let mut cuts = Vec::new();

    for hit in world.bodies_along_segment(current, previous) {
        if stroke.has_cut && !allow_multiple {
            log::debug!("Skipping body {}: stroke already cut", hit.body);
            continue;
        }
        stroke.has_cut = true;

        let Some(node) = scene.node_for_body(hit.body) else {
            continue;
        };
        let Some(vine) = node.kind.vine() else {
            continue;
        };
        if vines.get(vine).is_none_or(Vine::is_cut) {
            continue;
        }

        cuts.push(Cut {
            vine,
            node: node.id,
            body: hit.body,
            point: hit.point,
        });
    }

    cuts
}
