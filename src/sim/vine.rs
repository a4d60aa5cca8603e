//! Vines: chains of linked segments hanging from a fixed holder
//!
//! Level data lists one descriptor per vine. A vine's index in that list is
//! its id, and every segment node carries it so a cut anywhere can find the
//! rest of the rope.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::action::Texture;
use super::physics::{BodyDesc, BodyId, PhysicsWorld, Shape, category};
use super::scene::{NodeId, NodeKind, Scene, layer};
use crate::consts::*;
use crate::error::{LevelError, Result};
use crate::relative_to_viewport;

/// Vine identifier (index in the level data)
pub type VineId = usize;

/// One entry of the level data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VineDescriptor {
    /// Number of segments
    pub length: usize,
    /// Holder position as fractions of the viewport
    pub rel_anchor_point: Vec2,
}

impl VineDescriptor {
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.length == 0 {
            return Err(LevelError::InvalidVine {
                index,
                reason: "length must be at least 1".to_string(),
            });
        }
        let in_unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.rel_anchor_point.x) || !in_unit(self.rel_anchor_point.y) {
            return Err(LevelError::InvalidVine {
                index,
                reason: format!(
                    "anchor {:?} is outside the viewport",
                    self.rel_anchor_point
                ),
            });
        }
        Ok(())
    }
}

/// Parse and validate vine data
pub fn parse_vine_data(json: &str) -> Result<Vec<VineDescriptor>> {
    let vines: Vec<VineDescriptor> = serde_json::from_str(json)?;
    if vines.is_empty() {
        return Err(LevelError::NoVines);
    }
    for (index, vine) in vines.iter().enumerate() {
        vine.validate(index)?;
    }
    Ok(vines)
}

/// Load vine data from disk
pub fn load_vine_data(path: impl AsRef<Path>) -> Result<Vec<VineDescriptor>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let vines = parse_vine_data(&json)?;
    log::info!("Loaded {} vines from {}", vines.len(), path.display());
    Ok(vines)
}

/// A vine placed in the level
#[derive(Debug, Clone)]
pub struct Vine {
    pub id: VineId,
    /// Holder position in level coordinates
    pub anchor: Vec2,
    pub holder: NodeId,
    /// Segment nodes, holder end first
    pub segments: Vec<NodeId>,
    holder_body: BodyId,
    segment_bodies: Vec<BodyId>,
    cut: bool,
}

impl Vine {
    /// Create the holder and a straight chain of segments hanging below it
    pub fn build(
        id: VineId,
        descriptor: &VineDescriptor,
        viewport: Vec2,
        world: &mut PhysicsWorld,
        scene: &mut Scene,
    ) -> Self {
        let anchor = relative_to_viewport(descriptor.rel_anchor_point, viewport);

        let holder_body = world.add_body(
            BodyDesc::new(
                anchor,
                Shape::Circle {
                    radius: VINE_HOLDER_RADIUS,
                },
            )
            .fixed()
            .category(category::VINE_HOLDER),
        );
        let holder = scene.add_with_body(
            NodeKind::VineHolder,
            anchor,
            layer::VINE,
            Texture::VineHolder,
            holder_body,
        );

        let mut segments = Vec::with_capacity(descriptor.length);
        let mut segment_bodies = Vec::with_capacity(descriptor.length);
        let mut previous = holder_body;
        for i in 0..descriptor.length {
            let pos = Vec2::new(anchor.x, anchor.y - (i + 1) as f32 * VINE_SEGMENT_LENGTH);
            let body = world.add_body(
                BodyDesc::new(
                    pos,
                    Shape::Rect {
                        half_extents: Vec2::new(VINE_SEGMENT_HALF_WIDTH, VINE_SEGMENT_LENGTH / 2.0),
                    },
                )
                .density(VINE_SEGMENT_DENSITY)
                .category(category::VINE)
                .collides_with(category::VINE_HOLDER),
            );
            world.add_joint(previous, body, VINE_SEGMENT_LENGTH);
            segments.push(scene.add_with_body(
                NodeKind::VineSegment { vine: id },
                pos,
                layer::VINE,
                Texture::Vine,
                body,
            ));
            segment_bodies.push(body);
            previous = body;
        }

        Self {
            id,
            anchor,
            holder,
            segments,
            holder_body,
            segment_bodies,
            cut: false,
        }
    }

    /// Snap the last segment onto the prize and join them
    pub fn attach_to_prize(
        &self,
        prize_body: BodyId,
        world: &mut PhysicsWorld,
        scene: &mut Scene,
    ) -> bool {
        let (Some(&last_body), Some(&last_node)) =
            (self.segment_bodies.last(), self.segments.last())
        else {
            return false;
        };
        let Some(prize_pos) = world.body(prize_body).map(|b| b.pos) else {
            return false;
        };

        let attach = prize_pos + Vec2::new(0.0, 2.0 * PRIZE_RADIUS * PRIZE_ATTACH_OFFSET);
        world.set_position(last_body, attach);
        if let Some(node) = scene.node_mut(last_node) {
            node.position = attach;
        }
        world.add_joint(last_body, prize_body, attach.distance(prize_pos))
    }

    pub fn holder_body(&self) -> BodyId {
        self.holder_body
    }

    pub fn segment_bodies(&self) -> &[BodyId] {
        &self.segment_bodies
    }

    pub fn is_cut(&self) -> bool {
        self.cut
    }

    pub fn mark_cut(&mut self) {
        self.cut = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"[
        { "length": 20, "relAnchorPoint": [0.12, 0.945] },
        { "length": 18, "relAnchorPoint": [0.5, 0.945] },
        { "length": 15, "relAnchorPoint": [0.85, 0.945] }
    ]"#;

    #[test]
    fn test_parse_vine_data() {
        let vines = parse_vine_data(DATA).unwrap();
        assert_eq!(vines.len(), 3);
        assert_eq!(vines[1].length, 18);
        assert_eq!(vines[2].rel_anchor_point, Vec2::new(0.85, 0.945));
    }

    #[test]
    fn test_parse_rejects_bad_data() {
        assert!(matches!(
            parse_vine_data("not json"),
            Err(LevelError::Parse(_))
        ));
        assert!(matches!(parse_vine_data("[]"), Err(LevelError::NoVines)));
        assert!(matches!(
            parse_vine_data(r#"[{ "relAnchorPoint": [0.5, 0.5] }]"#),
            Err(LevelError::Parse(_))
        ));
        assert!(matches!(
            parse_vine_data(r#"[{ "length": 0, "relAnchorPoint": [0.5, 0.5] }]"#),
            Err(LevelError::InvalidVine { index: 0, .. })
        ));
        assert!(matches!(
            parse_vine_data(
                r#"[{ "length": 3, "relAnchorPoint": [0.5, 0.5] },
                    { "length": 3, "relAnchorPoint": [1.5, 0.5] }]"#
            ),
            Err(LevelError::InvalidVine { index: 1, .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_vine_data("does/not/exist.json").unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_build_hangs_segments_below_anchor() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut scene = Scene::new();
        let descriptor = VineDescriptor {
            length: 4,
            rel_anchor_point: Vec2::new(0.5, 1.0),
        };
        let vine = Vine::build(2, &descriptor, Vec2::new(200.0, 400.0), &mut world, &mut scene);

        assert_eq!(vine.anchor, Vec2::new(100.0, 400.0));
        assert_eq!(vine.segments.len(), 4);
        assert_eq!(scene.vine_segments(2), vine.segments);
        assert_eq!(world.joints().len(), 4);

        let last = scene.node(*vine.segments.last().unwrap()).unwrap();
        assert_eq!(last.position, Vec2::new(100.0, 400.0 - 4.0 * VINE_SEGMENT_LENGTH));
        assert!(!world.body(vine.holder_body()).unwrap().dynamic);
    }

    #[test]
    fn test_attach_to_prize() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut scene = Scene::new();
        let prize = world.add_body(BodyDesc::new(
            Vec2::new(100.0, 200.0),
            Shape::Circle {
                radius: PRIZE_RADIUS,
            },
        ));
        let descriptor = VineDescriptor {
            length: 3,
            rel_anchor_point: Vec2::new(0.5, 1.0),
        };
        let vine = Vine::build(0, &descriptor, Vec2::new(200.0, 400.0), &mut world, &mut scene);

        assert!(vine.attach_to_prize(prize, &mut world, &mut scene));
        let last = *vine.segment_bodies().last().unwrap();
        assert_eq!(world.joints_of(prize).count(), 1);
        assert!(world.joints_of(prize).all(|j| j.body_a == last));
        assert!(world.body(last).unwrap().pos.y > 200.0);
    }
}
