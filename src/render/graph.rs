//! Retained scene graph.
//!
//! Nodes carry a rigid transform, a visibility flag, a flat material and a
//! primitive [`Shape`]. There is no GPU backend here: the graph is the single
//! source of truth for what would be drawn and what can be picked.

use super::pick::{sort_hits, ObjectKey, Ray, RayHit};
use glam::{Mat4, Quat, Vec3};

/// Slot index plus the generation the slot had when the node was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn from_raw(index: u32) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

/// Primitive geometry in the node's local frame. Cylinders and cones are
/// centred on the origin with their axis along local +Y (cone apex at +Y).
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Group,
    Cylinder { radius: f32, height: f32 },
    Cone { radius: f32, height: f32, open_ended: bool },
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Ground plane in local XZ.
    Plane { width: f32, depth: f32 },
    DashedLine { start: Vec3, end: Vec3, dash: f32, gap: f32 },
}

impl Shape {
    fn intersect_local(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Shape::Group | Shape::DashedLine { .. } => None,
            Shape::Sphere { radius } => ray.intersect_sphere(Vec3::ZERO, radius),
            Shape::Box { size } => ray.intersect_aabb(-size * 0.5, size * 0.5),
            Shape::Cylinder { radius, height } | Shape::Cone { radius, height, .. } => {
                let half = Vec3::new(radius, height * 0.5, radius);
                ray.intersect_aabb(-half, half)
            }
            Shape::Plane { width, depth } => {
                let point = ray.intersect_ground(0.0)?;
                (point.x.abs() <= width * 0.5 && point.z.abs() <= depth * 0.5)
                    .then(|| point.distance(ray.origin))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub double_sided: bool,
}

impl Material {
    pub fn solid(color: u32) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            depth_test: true,
            double_sided: false,
        }
    }

    pub fn translucent(color: u32, opacity: f32) -> Self {
        Self {
            opacity,
            transparent: true,
            ..Self::solid(color)
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::solid(0xffffff)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub shape: Shape,
    pub material: Material,
    pub position: Vec3,
    pub rotation: Quat,
    pub visible: bool,
    pub owner: Option<ObjectKey>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            material: Material::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visible: true,
            owner: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, Shape::Group)
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_owner(mut self, owner: ObjectKey) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Node arena with a fixed root. Disposed slots are recycled under a new
/// generation, so a stale `NodeId` resolves to `None` instead of aliasing the
/// node that took its place.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::group("scene")),
            }],
            free: Vec::new(),
            root: NodeId::from_raw(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds a detached node.
    pub fn create(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.node = Some(node);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Adds a node under `parent`.
    pub fn spawn(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.create(node);
        self.attach(parent, id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, root included.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Re-parents `child` under `parent`, detaching it from any previous parent.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            log::warn!("Ignoring attach of {:?} under {:?}", child, parent);
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// True when `id` is connected to the scene root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return true;
            }
            current = self.get(node_id).and_then(|node| node.parent);
        }
        false
    }

    /// Attached and visible along the whole parent chain.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            if node_id == self.root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Detaches and frees `id` together with its whole subtree.
    pub fn dispose(&mut self, id: NodeId) {
        if id == self.root {
            log::warn!("Refusing to dispose the scene root");
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(node_id.index as usize)
                .filter(|slot| slot.generation == node_id.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node_id.index);
                stack.extend(node.children);
            }
        }
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.get_mut(id) {
            node.visible = visible;
        }
    }

    pub fn set_color(&mut self, id: NodeId, color: u32) {
        if let Some(node) = self.get_mut(id) {
            node.material.color = color;
        }
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else {
                break;
            };
            matrix = node.local_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    /// All nodes of the subtree rooted at `id`, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.get(node_id) else {
                continue;
            };
            out.push(node_id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Casts `ray` against `candidates`, skipping nodes that are detached or
    /// hidden. Hits come back nearest first.
    pub fn raycast(&self, ray: &Ray, candidates: &[NodeId]) -> Vec<RayHit> {
        let mut hits = Vec::new();
        for &id in candidates {
            if !self.is_effectively_visible(id) {
                continue;
            }
            let Some(node) = self.get(id) else {
                continue;
            };
            // Transforms are rigid, so local distances equal world distances.
            let inverse = self.world_matrix(id).inverse();
            let local = Ray::new(
                inverse.transform_point3(ray.origin),
                inverse.transform_vector3(ray.direction),
            );
            if let Some(distance) = node.shape.intersect_local(&local) {
                hits.push(RayHit {
                    node: id,
                    owner: node.owner,
                    distance,
                    point: ray.at(distance),
                });
            }
        }
        sort_hits(&mut hits);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_frees_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.spawn(root, Node::group("object"));
        let child = graph.spawn(group, Node::new("part", Shape::Sphere { radius: 1.0 }));
        assert_eq!(graph.live_count(), 3);
        graph.dispose(group);
        assert_eq!(graph.live_count(), 1);
        assert!(!graph.contains(child));
        assert!(graph.get(root).unwrap().children().is_empty());
    }

    #[test]
    fn disposed_slots_are_recycled_without_aliasing() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let first = graph.spawn(root, Node::new("marker", Shape::Sphere { radius: 0.35 }));
        graph.dispose(first);
        let second = graph.spawn(root, Node::new("marker", Shape::Sphere { radius: 0.35 }));
        assert_ne!(first, second);
        assert!(graph.get(first).is_none());
        assert!(graph.contains(second));
        graph.dispose(first);
        assert!(graph.contains(second));

        for _ in 0..10_000 {
            let id = graph.spawn(root, Node::group("clone"));
            graph.dispose(id);
        }
        assert_eq!(graph.live_count(), 2);
        assert!(graph.slots.len() <= 3);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.spawn(
            root,
            Node::group("object")
                .with_position(Vec3::new(1.0, 0.0, 0.0))
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let child = graph.spawn(
            group,
            Node::group("part").with_position(Vec3::new(1.0, 0.0, 0.0)),
        );
        let world = graph.world_position(child);
        assert!((world - Vec3::new(1.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn raycast_skips_hidden_and_detached() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let visible = graph.spawn(
            root,
            Node::new("a", Shape::Sphere { radius: 0.5 }).with_position(Vec3::new(0.0, 0.0, -5.0)),
        );
        let hidden = graph.spawn(
            root,
            Node::new("b", Shape::Sphere { radius: 0.5 })
                .with_position(Vec3::new(0.0, 0.0, -3.0))
                .hidden(),
        );
        let detached = graph.create(
            Node::new("c", Shape::Sphere { radius: 0.5 }).with_position(Vec3::new(0.0, 0.0, -2.0)),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hits = graph.raycast(&ray, &[visible, hidden, detached]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, visible);
        assert!((hits[0].distance - 4.5).abs() < 1e-4);
    }

    #[test]
    fn raycast_respects_rotation() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        // Thin cylinder lying along X after rotation.
        let bar = graph.spawn(
            root,
            Node::new(
                "bar",
                Shape::Cylinder {
                    radius: 0.05,
                    height: 2.0,
                },
            )
            .with_rotation(Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2)),
        );
        let down_at_tip = Ray::new(Vec3::new(0.9, 5.0, 0.0), Vec3::NEG_Y);
        assert_eq!(graph.raycast(&down_at_tip, &[bar]).len(), 1);
        let down_off_axis = Ray::new(Vec3::new(0.0, 5.0, 0.9), Vec3::NEG_Y);
        assert!(graph.raycast(&down_off_axis, &[bar]).is_empty());
    }

    #[test]
    fn reattach_moves_node() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.spawn(root, Node::group("a"));
        let b = graph.spawn(root, Node::group("b"));
        let leaf = graph.spawn(a, Node::group("leaf"));
        graph.attach(b, leaf);
        assert!(graph.get(a).unwrap().children().is_empty());
        assert_eq!(graph.get(leaf).unwrap().parent(), Some(b));
        graph.detach(b);
        assert!(!graph.is_attached(leaf));
    }
}
