mod camera;
mod graph;
pub mod highlight;
pub mod objects;
pub mod pick;
pub mod preview;
mod trajectory;

pub use camera::{CameraController, CameraMovement, Projection};
pub use graph::{Material, Node, NodeId, SceneGraph, Shape};
pub use objects::{DesignedEmitter, DesignedListener, DesignedObject};
pub use pick::{ObjectKey, ObjectKind, Ray, RayHit};
pub use trajectory::TrajectoryLines;

use glam::Vec3;

pub const GROUND_SIZE: f32 = 100.0;
pub const GROUND_COLOR: u32 = 0xdddddd;

/// Scene graph, camera and viewport of one designer canvas.
pub struct SceneView {
    pub graph: SceneGraph,
    pub camera: CameraController,
    width: u32,
    height: u32,
    ground: NodeId,
}

impl SceneView {
    pub fn new(camera: CameraController, width: u32, height: u32) -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let ground = graph.spawn(
            root,
            Node::new(
                "ground",
                Shape::Plane {
                    width: GROUND_SIZE,
                    depth: GROUND_SIZE,
                },
            )
            .with_material(Material::solid(GROUND_COLOR)),
        );
        Self {
            graph,
            camera,
            width: width.max(1),
            height: height.max(1),
            ground,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        log::debug!("Viewport resized to {}×{}", self.width, self.height);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn ground(&self) -> NodeId {
        self.ground
    }

    pub fn screen_ray(&self, x: f32, y: f32) -> Ray {
        self.camera
            .screen_ray(x, y, self.width as f32, self.height as f32)
    }

    /// Point on the ground plane under pixel (`x`, `y`).
    pub fn pick_ground(&self, x: f32, y: f32) -> Option<Vec3> {
        let ray = self.screen_ray(x, y);
        self.graph
            .raycast(&ray, &[self.ground])
            .first()
            .map(|hit| hit.point)
    }

    /// Hits among `candidates` under pixel (`x`, `y`), nearest first.
    pub fn pick(&self, x: f32, y: f32, candidates: &[NodeId]) -> Vec<RayHit> {
        let ray = self.screen_ray(x, y);
        self.graph.raycast(&ray, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_click_lands_on_ground() {
        let camera = CameraController::new(Vec3::new(0.0, 5.0, 10.0), 0.0, -0.5);
        let view = SceneView::new(camera, 800, 600);
        let point = view.pick_ground(400.0, 300.0).unwrap();
        assert!(point.y.abs() < 1e-4);
        let expected_z = 10.0 - 5.0 / 0.5f32.tan();
        assert!((point.z - expected_z).abs() < 1e-2);
    }

    #[test]
    fn sky_click_misses_ground() {
        let camera = CameraController::new(Vec3::new(0.0, 5.0, 10.0), 0.0, 0.0);
        let view = SceneView::new(camera, 800, 600);
        assert!(view.pick_ground(400.0, 10.0).is_none());
    }
}
