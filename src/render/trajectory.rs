use super::graph::{Material, Node, NodeId, SceneGraph, Shape};
use crate::scene::{EmitterData, ObjectId};
use std::collections::HashMap;

pub const TRAJECTORY_COLOR: u32 = 0x0000ff;
const TRAJECTORY_OPACITY: f32 = 0.5;
const TRAJECTORY_DASH: f32 = 0.5;
const TRAJECTORY_GAP: f32 = 0.2;

/// Dashed start-to-end lines, one per emitter id.
#[derive(Default)]
pub struct TrajectoryLines {
    lines: HashMap<ObjectId, NodeId>,
}

impl TrajectoryLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the line for `data`, or removes it when there is no end point.
    pub fn update(&mut self, graph: &mut SceneGraph, data: &EmitterData) {
        let Some(end) = data.end_point else {
            self.remove(graph, data.id);
            return;
        };
        let shape = Shape::DashedLine {
            start: data.start_point.to_vec3(),
            end: end.to_vec3(),
            dash: TRAJECTORY_DASH,
            gap: TRAJECTORY_GAP,
        };
        if let Some(node) = self.lines.get(&data.id).and_then(|id| graph.get_mut(*id)) {
            node.shape = shape;
            return;
        }
        let material = Material {
            depth_test: false,
            ..Material::translucent(TRAJECTORY_COLOR, TRAJECTORY_OPACITY)
        };
        let root = graph.root();
        let node = graph.spawn(
            root,
            Node::new(format!("trajectory-{}", data.id), shape).with_material(material),
        );
        self.lines.insert(data.id, node);
    }

    pub fn remove(&mut self, graph: &mut SceneGraph, id: ObjectId) {
        if let Some(node) = self.lines.remove(&id) {
            graph.dispose(node);
        }
    }

    pub fn clear(&mut self, graph: &mut SceneGraph) {
        for (_, node) in self.lines.drain() {
            graph.dispose(node);
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<NodeId> {
        self.lines.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Position;
    use glam::Vec3;

    fn endpoints(graph: &SceneGraph, node: NodeId) -> (Vec3, Vec3) {
        match graph.get(node).unwrap().shape {
            Shape::DashedLine { start, end, .. } => (start, end),
            ref other => panic!("Expected dashed line, got {:?}", other),
        }
    }

    #[test]
    fn line_tracks_endpoints_and_is_removed() {
        let mut graph = SceneGraph::new();
        let mut lines = TrajectoryLines::new();
        let mut emitter = EmitterData::new(3, Position::new(0.0, 1.0, 0.0));

        lines.update(&mut graph, &emitter);
        assert!(lines.is_empty());

        emitter.end_point = Some(Position::new(4.0, 2.0, 0.0));
        emitter.end_time = Some(5.0);
        lines.update(&mut graph, &emitter);
        let node = lines.get(3).unwrap();
        assert!(graph.is_attached(node));
        assert!(!graph.get(node).unwrap().material.depth_test);
        assert_eq!(endpoints(&graph, node).1, Vec3::new(4.0, 2.0, 0.0));

        emitter.start_point.x = -1.0;
        lines.update(&mut graph, &emitter);
        assert_eq!(lines.get(3), Some(node));
        assert_eq!(endpoints(&graph, node).0, Vec3::new(-1.0, 1.0, 0.0));

        let live = graph.live_count();
        emitter.end_point = None;
        emitter.end_time = None;
        lines.update(&mut graph, &emitter);
        assert!(lines.get(3).is_none());
        assert_eq!(graph.live_count(), live - 1);
    }
}
