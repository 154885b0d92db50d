//! Builds scene-graph representations of emitters and listeners.
//!
//! Factory functions allocate fresh nodes on every call and return the root
//! detached; the caller decides when it enters the scene. Every solid part is
//! tagged with the owning [`ObjectKey`] so a pick resolves straight to its
//! object.

use super::graph::{Material, Node, NodeId, SceneGraph, Shape};
use super::pick::{ObjectKey, ObjectKind};
use crate::scene::{EmitterData, ListenerData, ObjectId, Position};
use glam::{Mat3, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

pub const EMITTER_FUSELAGE_COLOR: u32 = 0xcccccc;
pub const EMITTER_NOSE_COLOR: u32 = 0x999999;
pub const EMITTER_WINGS_COLOR: u32 = 0x0077ff;
pub const EMITTER_TAIL_HOR_COLOR: u32 = 0x0077ff;
pub const EMITTER_TAIL_VER_COLOR: u32 = 0x0055cc;
pub const EMITTER_HIGHLIGHT: u32 = 0x6666ff;

pub const LISTENER_COLOR: u32 = 0x0000ff;
pub const LISTENER_BASE_COLOR: u32 = 0x333333;
pub const LISTENER_POLE_COLOR: u32 = 0x555555;
pub const LISTENER_HIGHLIGHT: u32 = 0x6666ff;

pub const LISTENER_CONE_HEIGHT: f32 = 0.6;
pub const LISTENER_CONE_HALF_ANGLE_DEG: f32 = 15.0;
const LISTENER_CONE_OPACITY: f32 = 0.25;
const LISTENER_MIC_OFFSET_X: f32 = 0.2;

pub const EDITED_OPACITY: f32 = 0.6;

pub const MARKER_COLOR: u32 = 0x00ff00;
pub const MARKER_RADIUS: f32 = 0.35;
const MARKER_OPACITY: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct EmitterParts {
    pub fuselage: NodeId,
    pub nose: NodeId,
    pub wings: NodeId,
    pub tail_horizontal: NodeId,
    pub tail_vertical: NodeId,
}

#[derive(Debug, Clone)]
pub struct DesignedEmitter {
    pub data: EmitterData,
    pub root: NodeId,
    pub parts: EmitterParts,
}

#[derive(Debug, Clone, Copy)]
pub struct ListenerParts {
    pub base: NodeId,
    pub pole: NodeId,
    pub rail: NodeId,
    pub mic_left: NodeId,
    pub mic_right: NodeId,
    pub cone_left: NodeId,
    pub cone_right: NodeId,
}

#[derive(Debug, Clone)]
pub struct DesignedListener {
    pub data: ListenerData,
    pub root: NodeId,
    pub parts: ListenerParts,
}

/// A domain record paired with its scene representation.
#[derive(Debug, Clone)]
pub enum DesignedObject {
    Emitter(DesignedEmitter),
    Listener(DesignedListener),
}

impl DesignedObject {
    pub fn id(&self) -> ObjectId {
        match self {
            DesignedObject::Emitter(emitter) => emitter.data.id,
            DesignedObject::Listener(listener) => listener.data.id,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            DesignedObject::Emitter(_) => ObjectKind::Emitter,
            DesignedObject::Listener(_) => ObjectKind::Listener,
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: self.kind(),
            id: self.id(),
        }
    }

    pub fn root(&self) -> NodeId {
        match self {
            DesignedObject::Emitter(emitter) => emitter.root,
            DesignedObject::Listener(listener) => listener.root,
        }
    }

    pub fn as_emitter(&self) -> Option<&DesignedEmitter> {
        match self {
            DesignedObject::Emitter(emitter) => Some(emitter),
            DesignedObject::Listener(_) => None,
        }
    }

    pub fn as_listener(&self) -> Option<&DesignedListener> {
        match self {
            DesignedObject::Listener(listener) => Some(listener),
            DesignedObject::Emitter(_) => None,
        }
    }

    /// Solid parts paired with their default colours. Listener cones are not
    /// part of this set.
    pub fn primary_parts(&self) -> Vec<(NodeId, u32)> {
        match self {
            DesignedObject::Emitter(emitter) => {
                let p = emitter.parts;
                vec![
                    (p.fuselage, EMITTER_FUSELAGE_COLOR),
                    (p.wings, EMITTER_WINGS_COLOR),
                    (p.tail_vertical, EMITTER_TAIL_VER_COLOR),
                    (p.tail_horizontal, EMITTER_TAIL_HOR_COLOR),
                    (p.nose, EMITTER_NOSE_COLOR),
                ]
            }
            DesignedObject::Listener(listener) => {
                let p = listener.parts;
                vec![
                    (p.base, LISTENER_BASE_COLOR),
                    (p.pole, LISTENER_POLE_COLOR),
                    (p.rail, LISTENER_COLOR),
                    (p.mic_left, LISTENER_COLOR),
                    (p.mic_right, LISTENER_COLOR),
                ]
            }
        }
    }

    /// Frees the whole representation. The record itself is untouched.
    pub fn dispose(&self, graph: &mut SceneGraph) {
        graph.dispose(self.root());
    }
}

fn part(
    graph: &mut SceneGraph,
    parent: NodeId,
    owner: ObjectKey,
    name: &str,
    shape: Shape,
    color: u32,
) -> NodeId {
    graph.spawn(
        parent,
        Node::new(name, shape)
            .with_material(Material::solid(color))
            .with_owner(owner),
    )
}

/// Aircraft-like model: nose along local +X, root at the start point.
pub fn create_emitter_display(graph: &mut SceneGraph, data: &EmitterData) -> DesignedEmitter {
    let owner = ObjectKey::emitter(data.id);
    let root = graph.create(
        Node::group(format!("emitter-{}", data.id))
            .with_position(data.start_point.to_vec3())
            .with_owner(owner),
    );
    // Cylinders and cones are built along +Y; this lays them along +X.
    let along_x = Quat::from_rotation_z(-FRAC_PI_2);

    let fuselage = part(
        graph,
        root,
        owner,
        "fuselage",
        Shape::Cylinder {
            radius: 0.05,
            height: 0.6,
        },
        EMITTER_FUSELAGE_COLOR,
    );
    let nose = part(
        graph,
        root,
        owner,
        "nose",
        Shape::Cone {
            radius: 0.05,
            height: 0.1,
            open_ended: false,
        },
        EMITTER_NOSE_COLOR,
    );
    let wings = part(
        graph,
        root,
        owner,
        "wings",
        Shape::Box {
            size: Vec3::new(0.15, 0.02, 0.3),
        },
        EMITTER_WINGS_COLOR,
    );
    let tail_horizontal = part(
        graph,
        root,
        owner,
        "tail-horizontal",
        Shape::Box {
            size: Vec3::new(0.05, 0.02, 0.15),
        },
        EMITTER_TAIL_HOR_COLOR,
    );
    let tail_vertical = part(
        graph,
        root,
        owner,
        "tail-vertical",
        Shape::Box {
            size: Vec3::new(0.02, 0.1, 0.05),
        },
        EMITTER_TAIL_VER_COLOR,
    );

    if let Some(node) = graph.get_mut(fuselage) {
        node.rotation = along_x;
    }
    if let Some(node) = graph.get_mut(nose) {
        node.rotation = along_x;
        node.position = Vec3::new(0.35, 0.0, 0.0);
    }
    if let Some(node) = graph.get_mut(tail_horizontal) {
        node.position = Vec3::new(-0.3, 0.0, 0.0);
    }
    if let Some(node) = graph.get_mut(tail_vertical) {
        node.position = Vec3::new(-0.3, 0.05, 0.0);
    }

    DesignedEmitter {
        data: data.clone(),
        root,
        parts: EmitterParts {
            fuselage,
            nose,
            wings,
            tail_horizontal,
            tail_vertical,
        },
    }
}

pub fn listener_cone_radius() -> f32 {
    LISTENER_CONE_HEIGHT * LISTENER_CONE_HALF_ANGLE_DEG.to_radians().tan()
}

/// Microphone stand on the ground: base disc, pole up to the listener height,
/// a rail with two microphones, and two sensing cones facing local -Z.
pub fn create_listener_display(graph: &mut SceneGraph, data: &ListenerData) -> DesignedListener {
    let owner = ObjectKey::listener(data.id);
    let root = graph.create(Node::group(format!("listener-{}", data.id)).with_owner(owner));

    let base = part(
        graph,
        root,
        owner,
        "base",
        Shape::Cylinder {
            radius: 0.15,
            height: 0.1,
        },
        LISTENER_BASE_COLOR,
    );
    if let Some(node) = graph.get_mut(base) {
        node.position = Vec3::new(0.0, 0.05, 0.0);
    }
    let pole = part(
        graph,
        root,
        owner,
        "pole",
        Shape::Cylinder {
            radius: 0.03,
            height: 1.0,
        },
        LISTENER_POLE_COLOR,
    );
    let rail = part(
        graph,
        root,
        owner,
        "rail",
        Shape::Cylinder {
            radius: 0.02,
            height: 2.0 * LISTENER_MIC_OFFSET_X,
        },
        LISTENER_COLOR,
    );
    if let Some(node) = graph.get_mut(rail) {
        node.rotation = Quat::from_rotation_z(-FRAC_PI_2);
    }
    let mic_left = part(
        graph,
        root,
        owner,
        "mic-left",
        Shape::Sphere { radius: 0.05 },
        LISTENER_COLOR,
    );
    let mic_right = part(
        graph,
        root,
        owner,
        "mic-right",
        Shape::Sphere { radius: 0.05 },
        LISTENER_COLOR,
    );

    let cone_material = Material {
        depth_write: false,
        double_sided: true,
        ..Material::translucent(LISTENER_COLOR, LISTENER_CONE_OPACITY)
    };
    let cone_shape = Shape::Cone {
        radius: listener_cone_radius(),
        height: LISTENER_CONE_HEIGHT,
        open_ended: true,
    };
    let cone = |graph: &mut SceneGraph, name: &str| {
        graph.spawn(
            root,
            Node::new(name, cone_shape.clone())
                .with_material(cone_material)
                // Apex (+Y) turned to +Z so the opening faces -Z.
                .with_rotation(Quat::from_rotation_x(FRAC_PI_2))
                .with_owner(owner)
                .hidden(),
        )
    };
    let cone_left = cone(graph, "cone-left");
    let cone_right = cone(graph, "cone-right");

    let listener = DesignedListener {
        data: data.clone(),
        root,
        parts: ListenerParts {
            base,
            pole,
            rail,
            mic_left,
            mic_right,
            cone_left,
            cone_right,
        },
    };
    update_listener_geometry(graph, &listener);
    listener
}

/// Re-derives every height-dependent part and the root transform from
/// `listener.data`. Pole, rail, microphones and cones always move together.
pub fn update_listener_geometry(graph: &mut SceneGraph, listener: &DesignedListener) {
    let data = &listener.data;
    let height = data.position.y;
    let p = listener.parts;

    if let Some(root) = graph.get_mut(listener.root) {
        root.position = Vec3::new(data.position.x, 0.0, data.position.z);
        root.rotation = Quat::from_rotation_y(data.rotation.to_radians());
    }
    if let Some(pole) = graph.get_mut(p.pole) {
        pole.shape = Shape::Cylinder {
            radius: 0.03,
            height,
        };
        pole.position = Vec3::new(0.0, height * 0.5, 0.0);
    }
    if let Some(rail) = graph.get_mut(p.rail) {
        rail.position = Vec3::new(0.0, height, 0.0);
    }
    let mics = [
        (p.mic_left, p.cone_left, -LISTENER_MIC_OFFSET_X),
        (p.mic_right, p.cone_right, LISTENER_MIC_OFFSET_X),
    ];
    for (mic, cone, x) in mics {
        let mic_position = Vec3::new(x, height, 0.0);
        if let Some(node) = graph.get_mut(mic) {
            node.position = mic_position;
        }
        if let Some(node) = graph.get_mut(cone) {
            node.position = mic_position - Vec3::new(0.0, 0.0, LISTENER_CONE_HEIGHT * 0.5);
        }
    }
}

/// Length of the rendered pole, for checks against the listener height.
pub fn listener_pole_length(graph: &SceneGraph, listener: &DesignedListener) -> Option<f32> {
    match graph.get(listener.parts.pole)?.shape {
        Shape::Cylinder { height, .. } => Some(height),
        _ => None,
    }
}

/// Orientation that points the emitter nose (+X) from `start` towards `end`,
/// keeping the model upright. `None` when the points coincide.
pub fn emitter_heading(start: Position, end: Position) -> Option<Quat> {
    let start = start.to_vec3();
    let end = end.to_vec3();
    if start.distance_squared(end) < 1e-4 {
        return None;
    }
    let direction = (end - start).normalize();
    let side = Vec3::Y.cross(direction);
    if side.length_squared() < 1e-8 {
        return Some(Quat::from_rotation_arc(Vec3::X, direction));
    }
    // Basis with +Z on the direction, then turned so +X takes its place.
    let x_axis = side.normalize();
    let y_axis = direction.cross(x_axis);
    let facing = Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, direction));
    Some(facing * Quat::from_rotation_y(-FRAC_PI_2))
}

/// Gives the primary parts the translucent "being edited" look.
pub fn mark_as_edited(graph: &mut SceneGraph, object: &DesignedObject) {
    for (node, _) in object.primary_parts() {
        if let Some(node) = graph.get_mut(node) {
            node.material.transparent = true;
            node.material.opacity = EDITED_OPACITY;
            node.material.depth_write = true;
        }
    }
}

/// Staging marker for a pending placement.
pub fn create_placement_marker(graph: &mut SceneGraph, position: Vec3) -> NodeId {
    graph.create(
        Node::new(
            "placement-marker",
            Shape::Sphere {
                radius: MARKER_RADIUS,
            },
        )
        .with_material(Material::translucent(MARKER_COLOR, MARKER_OPACITY))
        .with_position(position),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener_at(height: f32, rotation: f32) -> ListenerData {
        let mut data = ListenerData::new(4, Position::new(2.0, height, -1.0));
        data.set_rotation(rotation);
        data
    }

    #[test]
    fn emitter_parts_are_tagged() {
        let mut graph = SceneGraph::new();
        let data = EmitterData::new(7, Position::new(1.0, 2.0, 3.0));
        let emitter = create_emitter_display(&mut graph, &data);
        let object = DesignedObject::Emitter(emitter.clone());
        for (node, color) in object.primary_parts() {
            let node = graph.get(node).unwrap();
            assert_eq!(node.owner, Some(ObjectKey::emitter(7)));
            assert_eq!(node.material.color, color);
        }
        let root = graph.get(emitter.root).unwrap();
        assert_eq!(root.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(!graph.is_attached(emitter.root));
        let nose = graph.world_position(emitter.parts.nose);
        assert!((nose - Vec3::new(1.35, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn listener_parts_follow_height() {
        let mut graph = SceneGraph::new();
        let listener = create_listener_display(&mut graph, &listener_at(1.7, 0.0));
        assert_eq!(listener_pole_length(&graph, &listener), Some(1.7));
        let pole = graph.get(listener.parts.pole).unwrap();
        assert!((pole.position.y - 0.85).abs() < 1e-6);
        for node in [
            listener.parts.rail,
            listener.parts.mic_left,
            listener.parts.mic_right,
            listener.parts.cone_left,
            listener.parts.cone_right,
        ] {
            assert!((graph.get(node).unwrap().position.y - 1.7).abs() < 1e-6);
        }
        let cone = graph.get(listener.parts.cone_left).unwrap();
        assert!((cone.position.z + LISTENER_CONE_HEIGHT * 0.5).abs() < 1e-6);
        assert!(!cone.visible);
        assert!(!cone.material.depth_write);
        assert!(cone.material.double_sided);
        let root = graph.get(listener.root).unwrap();
        assert_eq!(root.position, Vec3::new(2.0, 0.0, -1.0));
    }

    #[test]
    fn cone_radius_from_half_angle() {
        let expected = 0.6 * 15f32.to_radians().tan();
        assert!((listener_cone_radius() - expected).abs() < 1e-6);
    }

    #[test]
    fn listener_rotation_turns_root() {
        let mut graph = SceneGraph::new();
        let listener = create_listener_display(&mut graph, &listener_at(1.0, 90.0));
        let cone_tip = graph.world_matrix(listener.parts.cone_right);
        let forward = cone_tip.transform_vector3(Vec3::NEG_Y);
        // Cone opening faces local -Z, turned 90 degrees about +Y.
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn edited_look_skips_cones() {
        let mut graph = SceneGraph::new();
        let listener = create_listener_display(&mut graph, &listener_at(1.0, 0.0));
        let object = DesignedObject::Listener(listener.clone());
        mark_as_edited(&mut graph, &object);
        let pole = graph.get(listener.parts.pole).unwrap();
        assert!(pole.material.transparent);
        assert_eq!(pole.material.opacity, EDITED_OPACITY);
        let cone = graph.get(listener.parts.cone_left).unwrap();
        assert_eq!(cone.material.opacity, 0.25);
        assert!(!cone.material.depth_write);
    }

    #[test]
    fn heading_points_nose_at_end() {
        let start = Position::new(0.0, 1.0, 0.0);
        let end = Position::new(0.0, 1.0, -5.0);
        let heading = emitter_heading(start, end).unwrap();
        assert!((heading * Vec3::X - Vec3::NEG_Z).length() < 1e-5);
        assert!((heading * Vec3::Y - Vec3::Y).length() < 1e-5);

        let climbing = emitter_heading(start, Position::new(3.0, 4.0, 0.0)).unwrap();
        let expected = Vec3::new(3.0, 3.0, 0.0).normalize();
        assert!((climbing * Vec3::X - expected).length() < 1e-5);

        assert!(emitter_heading(start, Position::new(0.001, 1.0, 0.0)).is_none());
        let vertical = emitter_heading(start, Position::new(0.0, 3.0, 0.0)).unwrap();
        assert!((vertical * Vec3::X - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn dispose_removes_everything() {
        let mut graph = SceneGraph::new();
        let before = graph.live_count();
        let listener = create_listener_display(&mut graph, &listener_at(1.0, 0.0));
        let object = DesignedObject::Listener(listener);
        assert_eq!(graph.live_count(), before + 8);
        object.dispose(&mut graph);
        assert_eq!(graph.live_count(), before);
    }
}
