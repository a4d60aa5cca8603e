//! 2D rigid-body world
//!
//! Position-based integration with distance joints. Bodies are circles or
//! axis-aligned boxes; nothing rotates. The world reports begin-contacts for
//! pairs whose category/contact masks match and answers segment queries for
//! swipe cutting.

use std::collections::BTreeSet;

use glam::Vec2;
use crate::closest_point_on_segment;
use crate::consts::SOLVER_ITERATIONS;

/// Physics body identifier (stable for the lifetime of a world)
pub type BodyId = u32;

/// Category bit masks
pub mod category {
    pub const NONE: u32 = 0;
    pub const CROCODILE: u32 = 0b1;
    pub const VINE_HOLDER: u32 = 0b10;
    pub const VINE: u32 = 0b100;
    pub const PRIZE: u32 = 0b1000;
}

/// Collision shape, centred on the body position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

impl Shape {
    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rect { half_extents } => 4.0 * half_extents.x * half_extents.y,
        }
    }
}

/// Everything needed to create a body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub pos: Vec2,
    pub shape: Shape,
    pub density: f32,
    pub dynamic: bool,
    pub category: u32,
    pub collision_mask: u32,
    pub contact_mask: u32,
}

impl BodyDesc {
    /// A dynamic body that collides with nothing and reports no contacts
    pub fn new(pos: Vec2, shape: Shape) -> Self {
        Self {
            pos,
            shape,
            density: 1.0,
            dynamic: true,
            category: category::NONE,
            collision_mask: category::NONE,
            contact_mask: category::NONE,
        }
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.dynamic = false;
        self
    }

    pub fn category(mut self, category: u32) -> Self {
        self.category = category;
        self
    }

    pub fn collides_with(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn contacts_with(mut self, mask: u32) -> Self {
        self.contact_mask = mask;
        self
    }
}

/// A rigid body in the world
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub density: f32,
    pub dynamic: bool,
    pub category: u32,
    pub collision_mask: u32,
    pub contact_mask: u32,
    /// Position at the start of the current step (for velocity recovery)
    prev_pos: Vec2,
}

impl Body {
    pub fn mass(&self) -> f32 {
        self.shape.area() * self.density
    }

    /// Inverse mass (0 for static bodies)
    pub fn inv_mass(&self) -> f32 {
        let mass = self.mass();
        if !self.dynamic || mass <= 0.0 {
            0.0
        } else {
            1.0 / mass
        }
    }

    fn wants_contact_with(&self, other: &Body) -> bool {
        self.contact_mask & other.category != 0 || other.contact_mask & self.category != 0
    }

    fn collides_with(&self, other: &Body) -> bool {
        self.collision_mask & other.category != 0 || other.collision_mask & self.category != 0
    }
}

/// Distance joint between two bodies
#[derive(Debug, Clone, Copy)]
pub struct Joint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub rest_length: f32,
}

/// Begin-contact notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub point: Vec2,
}

impl Contact {
    /// True if this contact is exactly the pair {a, b}, in either order
    pub fn is_between(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }
}

/// One body crossed by a segment query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    pub point: Vec2,
    pub normal: Vec2,
    /// Distance from the query start
    pub distance: f32,
}

/// The physics world
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Gravity in points/s²
    pub gravity: Vec2,
    /// Simulation speed multiplier
    pub speed: f32,
    /// Bodies, sorted by id for deterministic iteration
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    /// Pairs currently overlapping (lower id first)
    touching: BTreeSet<(BodyId, BodyId)>,
    next_id: BodyId,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            speed: 1.0,
            bodies: Vec::new(),
            joints: Vec::new(),
            touching: BTreeSet::new(),
            next_id: 1,
        }
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            pos: desc.pos,
            vel: Vec2::ZERO,
            shape: desc.shape,
            density: desc.density,
            dynamic: desc.dynamic,
            category: desc.category,
            collision_mask: desc.collision_mask,
            contact_mask: desc.contact_mask,
            prev_pos: desc.pos,
        });
        id
    }

    /// Remove a body and every joint attached to it
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.bodies.remove(idx);
        self.joints.retain(|j| j.body_a != id && j.body_b != id);
        self.touching.retain(|&(a, b)| a != id && b != id);
        true
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index_of(id).map(move |i| &mut self.bodies[i])
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Teleport a body (resets its velocity)
    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.pos = pos;
            body.prev_pos = pos;
            body.vel = Vec2::ZERO;
        }
    }

    /// Join two bodies with a fixed-length link
    pub fn add_joint(&mut self, body_a: BodyId, body_b: BodyId, rest_length: f32) -> bool {
        if self.index_of(body_a).is_none() || self.index_of(body_b).is_none() {
            return false;
        }
        self.joints.push(Joint {
            body_a,
            body_b,
            rest_length: rest_length.max(0.0),
        });
        true
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Joints attached to a body
    pub fn joints_of(&self, id: BodyId) -> impl Iterator<Item = &Joint> {
        self.joints
            .iter()
            .filter(move |j| j.body_a == id || j.body_b == id)
    }

    /// Advance the world and return the contacts that began during this step
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        let dt = dt * self.speed;
        if dt <= 0.0 {
            return Vec::new();
        }

        // Integrate
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().filter(|b| b.dynamic) {
            body.vel += gravity * dt;
            body.prev_pos = body.pos;
            body.pos += body.vel * dt;
        }

        // Relax joints, then push apart colliding bodies
        for _ in 0..SOLVER_ITERATIONS {
            for j in 0..self.joints.len() {
                let joint = self.joints[j];
                self.solve_joint(&joint);
            }
        }
        self.resolve_collisions();

        // Recover velocities from the corrected positions
        for body in self.bodies.iter_mut().filter(|b| b.dynamic) {
            body.vel = (body.pos - body.prev_pos) / dt;
        }

        self.detect_contacts()
    }

    /// All bodies crossed by the segment `start..end`, nearest first
    pub fn bodies_along_segment(&self, start: Vec2, end: Vec2) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .bodies
            .iter()
            .filter_map(|body| segment_hit(body, start, end))
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.body.cmp(&b.body))
        });
        hits
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    fn solve_joint(&mut self, joint: &Joint) {
        let (Some(ia), Some(ib)) = (self.index_of(joint.body_a), self.index_of(joint.body_b))
        else {
            return;
        };
        let wa = self.bodies[ia].inv_mass();
        let wb = self.bodies[ib].inv_mass();
        let total = wa + wb;
        if total <= 0.0 {
            return;
        }

        let delta = self.bodies[ib].pos - self.bodies[ia].pos;
        let dist = delta.length();
        if dist < 1e-6 {
            return;
        }
        let correction = delta * ((dist - joint.rest_length) / dist / total);
        self.bodies[ia].pos += correction * wa;
        self.bodies[ib].pos -= correction * wb;
    }

    fn resolve_collisions(&mut self) {
        for i in 0..self.bodies.len() {
            for k in (i + 1)..self.bodies.len() {
                if !self.bodies[i].collides_with(&self.bodies[k]) {
                    continue;
                }
                let Some((normal, depth)) = penetration(&self.bodies[i], &self.bodies[k]) else {
                    continue;
                };
                let wa = self.bodies[i].inv_mass();
                let wb = self.bodies[k].inv_mass();
                let total = wa + wb;
                if total <= 0.0 {
                    continue;
                }
                // normal points from i to k
                self.bodies[i].pos -= normal * depth * (wa / total);
                self.bodies[k].pos += normal * depth * (wb / total);
            }
        }
    }

    fn detect_contacts(&mut self) -> Vec<Contact> {
        let mut began = Vec::new();
        let mut still_touching = BTreeSet::new();

        for i in 0..self.bodies.len() {
            for k in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[k]);
                if !a.wants_contact_with(b) {
                    continue;
                }
                let Some(point) = overlap_point(a, b) else {
                    continue;
                };
                let pair = (a.id, b.id);
                if !self.touching.contains(&pair) {
                    began.push(Contact {
                        body_a: a.id,
                        body_b: b.id,
                        point,
                    });
                }
                still_touching.insert(pair);
            }
        }

        self.touching = still_touching;
        began
    }
}

/// Closest point on (or in) a box to `point`
fn clamp_to_rect(point: Vec2, center: Vec2, half_extents: Vec2) -> Vec2 {
    point.clamp(center - half_extents, center + half_extents)
}

/// Contact point if two bodies overlap
fn overlap_point(a: &Body, b: &Body) -> Option<Vec2> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let delta = b.pos - a.pos;
            (delta.length_squared() <= (ra + rb) * (ra + rb))
                .then(|| a.pos + delta.normalize_or_zero() * ra)
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            let closest = clamp_to_rect(a.pos, b.pos, half_extents);
            (closest.distance_squared(a.pos) <= radius * radius).then_some(closest)
        }
        (Shape::Rect { .. }, Shape::Circle { .. }) => overlap_point(b, a),
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            let min = (a.pos - ha).max(b.pos - hb);
            let max = (a.pos + ha).min(b.pos + hb);
            (min.x <= max.x && min.y <= max.y).then(|| (min + max) * 0.5)
        }
    }
}

/// Separation normal (from `a` toward `b`) and depth for overlapping bodies
fn penetration(a: &Body, b: &Body) -> Option<(Vec2, f32)> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let delta = b.pos - a.pos;
            let dist = delta.length();
            let depth = ra + rb - dist;
            (depth > 0.0).then(|| (delta.try_normalize().unwrap_or(Vec2::Y), depth))
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            let closest = clamp_to_rect(a.pos, b.pos, half_extents);
            let delta = closest - a.pos;
            let dist = delta.length();
            let depth = radius - dist;
            (depth > 0.0).then(|| (delta.try_normalize().unwrap_or(Vec2::NEG_Y), depth))
        }
        (Shape::Rect { .. }, Shape::Circle { .. }) => {
            penetration(b, a).map(|(normal, depth)| (-normal, depth))
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            let delta = b.pos - a.pos;
            let overlap = ha + hb - delta.abs();
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                return None;
            }
            if overlap.x < overlap.y {
                Some((Vec2::new(delta.x.signum(), 0.0), overlap.x))
            } else {
                Some((Vec2::new(0.0, delta.y.signum()), overlap.y))
            }
        }
    }
}

/// Where the segment `start..end` first enters a body
fn segment_hit(body: &Body, start: Vec2, end: Vec2) -> Option<RayHit> {
    let dir = end - start;
    let t = match body.shape {
        Shape::Circle { radius } => segment_circle(start, dir, body.pos, radius)?,
        Shape::Rect { half_extents } => {
            segment_rect(start, dir, body.pos - half_extents, body.pos + half_extents)?
        }
    };
    let point = start + dir * t;
    let normal = match body.shape {
        Shape::Circle { .. } => (point - body.pos).normalize_or_zero(),
        Shape::Rect { half_extents } => rect_surface_normal(point, body.pos, half_extents),
    };
    Some(RayHit {
        body: body.id,
        point,
        normal,
        distance: dir.length() * t,
    })
}

/// Entry parameter in [0, 1] of a segment against a circle
fn segment_circle(start: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let len_sq = dir.length_squared();
    if len_sq < 1e-8 {
        return (start.distance_squared(center) <= radius * radius).then_some(0.0);
    }
    // Segment does not come close enough
    let closest = closest_point_on_segment(center, start, start + dir);
    if closest.distance_squared(center) > radius * radius {
        return None;
    }
    let to_start = start - center;
    if to_start.length_squared() <= radius * radius {
        // Starts inside
        return Some(0.0);
    }
    let b = to_start.dot(dir);
    let c = to_start.length_squared() - radius * radius;
    let disc = b * b - len_sq * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / len_sq;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Slab test of a segment against an axis-aligned box
fn segment_rect(start: Vec2, dir: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = 1.0;

    for axis in 0..2 {
        let (s, d, lo, hi) = (start[axis], dir[axis], min[axis], max[axis]);
        if d.abs() < 1e-8 {
            if s < lo || s > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - s) / d;
        let t2 = (hi - s) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// Outward normal of the box face nearest to `point`
fn rect_surface_normal(point: Vec2, center: Vec2, half_extents: Vec2) -> Vec2 {
    let local = point - center;
    let gap = half_extents - local.abs();
    if gap.x < gap.y {
        Vec2::new(local.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, local.y.signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(world: &mut PhysicsWorld, pos: Vec2, radius: f32) -> BodyId {
        world.add_body(BodyDesc::new(pos, Shape::Circle { radius }))
    }

    #[test]
    fn test_gravity_moves_dynamic_bodies_only() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -100.0));
        let falling = circle(&mut world, Vec2::new(0.0, 100.0), 5.0);
        let pinned = world.add_body(
            BodyDesc::new(Vec2::new(50.0, 100.0), Shape::Circle { radius: 5.0 }).fixed(),
        );

        for _ in 0..10 {
            world.step(0.1);
        }

        assert!(world.body(falling).unwrap().pos.y < 100.0);
        assert_eq!(world.body(pinned).unwrap().pos, Vec2::new(50.0, 100.0));
    }

    #[test]
    fn test_speed_zero_freezes_world() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -100.0));
        let body = circle(&mut world, Vec2::ZERO, 5.0);
        world.speed = 0.0;
        world.step(1.0);
        assert_eq!(world.body(body).unwrap().pos, Vec2::ZERO);
    }

    #[test]
    fn test_joint_holds_body_under_anchor() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -1000.0));
        let anchor = world.add_body(
            BodyDesc::new(Vec2::new(0.0, 100.0), Shape::Circle { radius: 2.0 }).fixed(),
        );
        let bob = circle(&mut world, Vec2::new(0.0, 80.0), 5.0);
        assert!(world.add_joint(anchor, bob, 20.0));

        for _ in 0..120 {
            world.step(1.0 / 60.0);
        }

        let pos = world.body(bob).unwrap().pos;
        assert!((pos.distance(Vec2::new(0.0, 100.0)) - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_remove_body_drops_its_joints() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = circle(&mut world, Vec2::ZERO, 1.0);
        let b = circle(&mut world, Vec2::new(5.0, 0.0), 1.0);
        let c = circle(&mut world, Vec2::new(10.0, 0.0), 1.0);
        world.add_joint(a, b, 5.0);
        world.add_joint(b, c, 5.0);

        assert!(world.remove_body(b));
        assert!(world.joints().is_empty());
        assert!(world.body(b).is_none());
        assert!(!world.remove_body(b));
        assert!(!world.add_joint(a, b, 1.0));
    }

    #[test]
    fn test_segment_query_orders_hits_by_distance() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let far = circle(&mut world, Vec2::new(80.0, 0.0), 5.0);
        let near = circle(&mut world, Vec2::new(20.0, 0.0), 5.0);
        let _off_path = circle(&mut world, Vec2::new(50.0, 40.0), 5.0);

        let hits = world.bodies_along_segment(Vec2::ZERO, Vec2::new(100.0, 0.0));
        let ids: Vec<BodyId> = hits.iter().map(|h| h.body).collect();
        assert_eq!(ids, vec![near, far]);
        assert!((hits[0].point.x - 15.0).abs() < 1e-3);
        assert!((hits[0].normal - Vec2::NEG_X).length() < 1e-3);
    }

    #[test]
    fn test_segment_query_hits_box() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let block = world.add_body(BodyDesc::new(
            Vec2::new(0.0, 0.0),
            Shape::Rect {
                half_extents: Vec2::new(10.0, 5.0),
            },
        ));

        let hits = world.bodies_along_segment(Vec2::new(0.0, 50.0), Vec2::new(0.0, -50.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, block);
        assert!((hits[0].point.y - 5.0).abs() < 1e-3);
        assert_eq!(hits[0].normal, Vec2::Y);

        // Short segment that stops before the box
        assert!(world
            .bodies_along_segment(Vec2::new(0.0, 50.0), Vec2::new(0.0, 20.0))
            .is_empty());
    }

    #[test]
    fn test_segment_query_degenerate_segment_inside_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = circle(&mut world, Vec2::ZERO, 5.0);
        let hits = world.bodies_along_segment(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, body);
    }

    #[test]
    fn test_contact_begins_once_per_overlap() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let sensor = world.add_body(
            BodyDesc::new(
                Vec2::ZERO,
                Shape::Rect {
                    half_extents: Vec2::new(10.0, 10.0),
                },
            )
            .fixed()
            .category(category::CROCODILE)
            .contacts_with(category::PRIZE),
        );
        let prize = world.add_body(
            BodyDesc::new(Vec2::new(0.0, 30.0), Shape::Circle { radius: 5.0 })
                .category(category::PRIZE),
        );
        world.body_mut(prize).unwrap().vel = Vec2::new(0.0, -600.0);

        let mut contacts = Vec::new();
        for _ in 0..4 {
            contacts.extend(world.step(1.0 / 60.0));
        }

        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].is_between(prize, sensor));
    }

    #[test]
    fn test_unmasked_overlap_reports_nothing() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.add_body(
            BodyDesc::new(Vec2::ZERO, Shape::Circle { radius: 5.0 }).category(category::VINE),
        );
        world.add_body(
            BodyDesc::new(Vec2::new(1.0, 0.0), Shape::Circle { radius: 5.0 })
                .category(category::PRIZE),
        );
        assert!(world.step(1.0 / 60.0).is_empty());
    }

    #[test]
    fn test_collision_mask_separates_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let wall = world.add_body(
            BodyDesc::new(Vec2::ZERO, Shape::Circle { radius: 5.0 })
                .fixed()
                .category(category::VINE_HOLDER),
        );
        let link = world.add_body(
            BodyDesc::new(Vec2::new(6.0, 0.0), Shape::Circle { radius: 5.0 })
                .category(category::VINE)
                .collides_with(category::VINE_HOLDER),
        );
        world.step(1.0 / 60.0);

        let a = world.body(wall).unwrap().pos;
        let b = world.body(link).unwrap().pos;
        assert_eq!(a, Vec2::ZERO);
        assert!(a.distance(b) >= 10.0 - 1e-3);
    }
}
