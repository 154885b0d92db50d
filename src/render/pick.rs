//! CPU ray picking
//!
//! Screen clicks become world-space [`Ray`]s (see
//! [`CameraController::screen_ray`](super::CameraController::screen_ray)).
//! Scene nodes are tested in their local frame against simple bounds, and the
//! owning object is recovered from the node's [`ObjectKey`] tag.

use crate::scene::ObjectId;
use glam::Vec3;

/// Classification of pickable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Emitter,
    Listener,
}

/// Back-reference from a scene node to the designed object that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

impl ObjectKey {
    pub fn emitter(id: ObjectId) -> Self {
        Self {
            kind: ObjectKind::Emitter,
            id,
        }
    }

    pub fn listener(id: ObjectId) -> Self {
        Self {
            kind: ObjectKind::Listener,
            id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane `y = height`, in front of the origin.
    pub fn intersect_ground(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }

    /// Slab test against an axis-aligned box. Returns the entry distance, or
    /// the exit distance when the origin is inside.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (min - self.origin) * inv;
        let t2 = (max - self.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();
        if t_near > t_far || t_far < 0.0 || t_near.is_nan() || t_far.is_nan() {
            return None;
        }
        Some(if t_near >= 0.0 { t_near } else { t_far })
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -b - sqrt_d;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + sqrt_d;
        (far >= 0.0).then_some(far)
    }
}

/// Result of a pick operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: super::NodeId,
    pub owner: Option<ObjectKey>,
    pub distance: f32,
    pub point: Vec3,
}

/// Sorts hits by ascending distance; ties keep their input order.
pub fn sort_hits(hits: &mut [RayHit]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Owner of the nearest hit that carries an owner tag.
pub fn nearest_owner(hits: &[RayHit]) -> Option<ObjectKey> {
    hits.iter()
        .filter(|hit| hit.owner.is_some())
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
        .and_then(|hit| hit.owner)
}
