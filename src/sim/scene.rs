//! Scene graph
//!
//! A flat list of typed nodes under one root. Nodes may own a physics body and
//! at most one running action; running a new action on a node drops whatever
//! was left of the previous one.

use glam::Vec2;

use super::action::{Action, Appearance, Cue, RunningAction, Texture};
use super::physics::{BodyId, PhysicsWorld};
use super::vine::VineId;

/// Scene node identifier
pub type NodeId = u32;

/// What a node is. Only vine segments can be cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The level itself (runs level-wide actions)
    Root,
    Background,
    Water,
    Prize,
    Crocodile,
    VineHolder,
    VineSegment { vine: VineId },
}

impl NodeKind {
    pub fn vine(&self) -> Option<VineId> {
        match *self {
            NodeKind::VineSegment { vine } => Some(vine),
            _ => None,
        }
    }
}

/// Draw layers
pub mod layer {
    pub const BACKGROUND: f32 = 0.0;
    pub const CROCODILE: f32 = 1.0;
    pub const VINE: f32 = 1.0;
    pub const PRIZE: f32 = 2.0;
    pub const FOREGROUND: f32 = 3.0;
}

/// A node in the scene
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Vec2,
    pub z: f32,
    pub appearance: Appearance,
    pub body: Option<BodyId>,
    action: Option<RunningAction>,
}

impl SceneNode {
    pub fn has_actions(&self) -> bool {
        self.action.as_ref().is_some_and(|a| !a.is_finished())
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.action
            .as_ref()
            .filter(|a| !a.is_finished())
            .map(RunningAction::action)
    }
}

/// Result of advancing every node's actions
#[derive(Debug, Default)]
pub struct SceneUpdate {
    pub cues: Vec<Cue>,
    /// Nodes removed by their own actions (callers drop their bodies)
    pub removed: Vec<SceneNode>,
}

/// The scene graph
#[derive(Debug, Clone)]
pub struct Scene {
    /// Nodes sorted by id
    nodes: Vec<SceneNode>,
    root: NodeId,
    next_id: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            root: 0,
            next_id: 0,
        };
        scene.root = scene.add(NodeKind::Root, Vec2::ZERO, 0.0, Texture::Background);
        scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add(&mut self, kind: NodeKind, position: Vec2, z: f32, texture: Texture) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push(SceneNode {
            id,
            kind,
            position,
            z,
            appearance: Appearance::new(texture),
            body: None,
            action: None,
        });
        id
    }

    /// Add a node backed by a physics body
    pub fn add_with_body(
        &mut self,
        kind: NodeKind,
        position: Vec2,
        z: f32,
        texture: Texture,
        body: BodyId,
    ) -> NodeId {
        let id = self.add(kind, position, z, texture);
        if let Some(node) = self.node_mut(id) {
            node.body = Some(body);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.index_of(id).map(move |i| &mut self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Remove a node (the root stays). Returns it so the caller can drop its body.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        if id == self.root {
            return None;
        }
        self.index_of(id).map(|i| self.nodes.remove(i))
    }

    /// Node owning a physics body
    pub fn node_for_body(&self, body: BodyId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.body == Some(body))
    }

    /// Every remaining segment of a vine
    pub fn vine_segments(&self, vine: VineId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.kind.vine() == Some(vine))
            .map(|n| n.id)
            .collect()
    }

    /// First node of a kind
    pub fn find(&self, kind: NodeKind) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.kind == kind).map(|n| n.id)
    }

    /// Start an action on a node, cancelling the one it was running
    pub fn run(&mut self, id: NodeId, action: Action) {
        if let Some(node) = self.node_mut(id) {
            node.action = Some(RunningAction::new(action));
        }
    }

    pub fn remove_all_actions(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.action = None;
        }
    }

    /// Advance every node's action by `dt`
    pub fn advance(&mut self, dt: f32) -> SceneUpdate {
        let mut update = SceneUpdate::default();
        let mut doomed = Vec::new();

        for node in &mut self.nodes {
            let Some(running) = node.action.as_mut() else {
                continue;
            };
            let effects = running.update(&mut node.appearance, dt);
            update.cues.extend(effects.cues);
            if effects.removed {
                doomed.push(node.id);
            }
            if effects.finished {
                node.action = None;
            }
        }

        for id in doomed {
            if let Some(node) = self.remove(id) {
                update.removed.push(node);
            }
        }
        update
    }

    /// Copy body positions onto their nodes
    pub fn sync_from(&mut self, world: &PhysicsWorld) {
        for node in &mut self.nodes {
            if let Some(body) = node.body.and_then(|b| world.body(b)) {
                node.position = body.pos;
            }
        }
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }
}
