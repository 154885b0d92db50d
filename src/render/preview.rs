//! Draws the scene graph as flat shapes with an egui painter: wireframe boxes,
//! stroked cylinders and cones, filled spheres and the ground grid.

use super::graph::{Material, NodeId, SceneGraph, Shape};
use super::SceneView;
use egui::{pos2, Color32, Painter, Pos2, Rect, Stroke};
use glam::{Mat4, Vec3, Vec4Swizzles};

const GRID_STEP: f32 = 2.0;
const GRID_STROKE: f32 = 1.0;
const LINE_STROKE: f32 = 2.0;

pub fn color32(material: &Material) -> Color32 {
    let [_, r, g, b] = material.color.to_be_bytes();
    let alpha = if material.transparent {
        material.opacity.clamp(0.0, 1.0)
    } else {
        1.0
    };
    Color32::from_rgba_unmultiplied(r, g, b, (alpha * 255.0).round() as u8)
}

/// Maps world points into a screen rectangle through the view camera.
pub struct Projector {
    view: Mat4,
    projection: Mat4,
    near: f32,
    focal_px: f32,
    rect: Rect,
}

impl Projector {
    pub fn new(scene: &SceneView, rect: Rect) -> Self {
        let camera = &scene.camera;
        let aspect = rect.width().max(1.0) / rect.height().max(1.0);
        let half_fov = camera.projection.fov_y_deg.to_radians() * 0.5;
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(aspect),
            near: camera.projection.near,
            focal_px: rect.height() * 0.5 / half_fov.tan(),
            rect,
        }
    }

    fn to_screen(&self, view_space: Vec3) -> Pos2 {
        let clip = self.projection * view_space.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        pos2(
            self.rect.left() + (ndc.x + 1.0) * 0.5 * self.rect.width(),
            self.rect.top() + (1.0 - ndc.y) * 0.5 * self.rect.height(),
        )
    }

    /// Screen position of `world`, or `None` behind the near plane.
    pub fn point(&self, world: Vec3) -> Option<Pos2> {
        let view_space = self.view.transform_point3(world);
        (view_space.z < -self.near).then(|| self.to_screen(view_space))
    }

    /// Projects a segment, cut at the near plane.
    pub fn segment(&self, a: Vec3, b: Vec3) -> Option<[Pos2; 2]> {
        let mut a = self.view.transform_point3(a);
        let mut b = self.view.transform_point3(b);
        let limit = -self.near;
        match (a.z < limit, b.z < limit) {
            (false, false) => return None,
            (true, false) => b = a + (b - a) * ((limit - a.z) / (b.z - a.z)),
            (false, true) => a = b + (a - b) * ((limit - b.z) / (a.z - b.z)),
            (true, true) => {}
        }
        Some([self.to_screen(a), self.to_screen(b)])
    }

    /// On-screen size of a world-space length at `world`.
    pub fn pixels(&self, length: f32, world: Vec3) -> f32 {
        let depth = -self.view.transform_point3(world).z;
        if depth <= self.near {
            return 0.0;
        }
        length * self.focal_px / depth
    }

    fn depth(&self, world: Vec3) -> f32 {
        -self.view.transform_point3(world).z
    }
}

pub fn paint_scene(painter: &Painter, rect: Rect, scene: &SceneView) {
    let projector = Projector::new(scene, rect);
    let graph = &scene.graph;

    let mut drawables: Vec<(NodeId, f32)> = graph
        .descendants(graph.root())
        .into_iter()
        .filter(|id| graph.is_effectively_visible(*id))
        .filter_map(|id| {
            let node = graph.get(id)?;
            if node.shape == Shape::Group {
                return None;
            }
            let depth = projector.depth(graph.world_position(id));
            // Ground first, overlays without depth test last, the rest far to near.
            let layer = if matches!(node.shape, Shape::Plane { .. }) {
                f32::INFINITY
            } else if !node.material.depth_test {
                f32::NEG_INFINITY
            } else {
                depth
            };
            Some((id, layer))
        })
        .collect();
    drawables.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (id, _) in drawables {
        paint_node(painter, &projector, graph, id);
    }
}

fn paint_node(painter: &Painter, projector: &Projector, graph: &SceneGraph, id: NodeId) {
    let Some(node) = graph.get(id) else {
        return;
    };
    let world = graph.world_matrix(id);
    let color = color32(&node.material);
    let at = |local: Vec3| world.transform_point3(local);
    let line = |a: Vec3, b: Vec3, width: f32| {
        if let Some(points) = projector.segment(a, b) {
            painter.line_segment(points, Stroke::new(width, color));
        }
    };

    match node.shape {
        Shape::Group => {}
        Shape::Sphere { radius } => {
            let centre = at(Vec3::ZERO);
            if let Some(point) = projector.point(centre) {
                let radius = projector.pixels(radius, centre).max(1.0);
                painter.circle_filled(point, radius, color);
            }
        }
        Shape::Cylinder { radius, height } => {
            let centre = at(Vec3::ZERO);
            let width = projector.pixels(radius * 2.0, centre).max(1.0);
            line(
                at(Vec3::new(0.0, -height * 0.5, 0.0)),
                at(Vec3::new(0.0, height * 0.5, 0.0)),
                width,
            );
        }
        Shape::Cone { radius, height, .. } => {
            let apex = at(Vec3::new(0.0, height * 0.5, 0.0));
            for side in [-radius, radius] {
                line(apex, at(Vec3::new(side, -height * 0.5, 0.0)), GRID_STROKE);
                line(apex, at(Vec3::new(0.0, -height * 0.5, side)), GRID_STROKE);
            }
        }
        Shape::Box { size } => {
            let h = size * 0.5;
            let corner = |i: usize| {
                at(Vec3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                ))
            };
            for i in 0..8 {
                for bit in [1, 2, 4] {
                    if i & bit == 0 {
                        line(corner(i), corner(i | bit), LINE_STROKE);
                    }
                }
            }
        }
        Shape::Plane { width, depth } => {
            let (hw, hd) = (width * 0.5, depth * 0.5);
            let mut offset = -hw;
            while offset <= hw {
                line(at(Vec3::new(offset, 0.0, -hd)), at(Vec3::new(offset, 0.0, hd)), GRID_STROKE);
                offset += GRID_STEP;
            }
            let mut offset = -hd;
            while offset <= hd {
                line(at(Vec3::new(-hw, 0.0, offset)), at(Vec3::new(hw, 0.0, offset)), GRID_STROKE);
                offset += GRID_STEP;
            }
        }
        Shape::DashedLine {
            start,
            end,
            dash,
            gap,
        } => {
            let (start, end) = (at(start), at(end));
            let length = start.distance(end);
            if length <= f32::EPSILON || dash <= 0.0 {
                return;
            }
            let direction = (end - start) / length;
            let mut travelled = 0.0;
            while travelled < length {
                let stop = (travelled + dash).min(length);
                line(
                    start + direction * travelled,
                    start + direction * stop,
                    LINE_STROKE,
                );
                travelled = stop + gap.max(0.0);
            }
        }
    }
}
