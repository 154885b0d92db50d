use crate::render::CameraMovement;
use glam::Vec2;
use winit::keyboard::KeyCode;

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
}

impl InputState {
    /// Returns true when `key` is one of the movement keys.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        match key {
            KeyCode::KeyW => self.move_forward = pressed,
            KeyCode::KeyS => self.move_backward = pressed,
            KeyCode::KeyA => self.move_left = pressed,
            KeyCode::KeyD => self.move_right = pressed,
            _ => return false,
        }
        true
    }

    pub fn movement(&self) -> CameraMovement {
        CameraMovement {
            move_forward: self.move_forward,
            move_backward: self.move_backward,
            move_left: self.move_left,
            move_right: self.move_right,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    MouseDown,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerRelease {
    /// Press and release without crossing the drag threshold.
    Click(Vec2),
    /// The gesture was a camera drag, left the canvas, or never started.
    Ignored,
}

/// Tells clicks from camera drags for the primary button.
#[derive(Debug, Clone, Copy)]
pub struct PointerTracker {
    state: PointerState,
    reference: Vec2,
    left_canvas: bool,
    drag_threshold: f32,
}

impl PointerTracker {
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            state: PointerState::Idle,
            reference: Vec2::ZERO,
            left_canvas: false,
            drag_threshold,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn left_canvas(&self) -> bool {
        self.left_canvas
    }

    pub fn press(&mut self, position: Vec2) {
        self.state = PointerState::MouseDown;
        self.reference = position;
    }

    /// Returns the look delta once the gesture is a drag. The reference point
    /// moves with every drag step, so deltas are relative.
    pub fn motion(&mut self, position: Vec2) -> Option<Vec2> {
        if self.state == PointerState::Idle || self.left_canvas {
            return None;
        }
        let delta = position - self.reference;
        if self.state == PointerState::MouseDown
            && (delta.x.abs() > self.drag_threshold || delta.y.abs() > self.drag_threshold)
        {
            log::debug!("Pointer drag started");
            self.state = PointerState::Dragging;
        }
        if self.state != PointerState::Dragging {
            return None;
        }
        self.reference = position;
        Some(delta)
    }

    pub fn leave(&mut self) {
        if self.state != PointerState::Idle {
            self.left_canvas = true;
        }
    }

    pub fn enter(&mut self) {
        self.left_canvas = false;
    }

    /// Ends the gesture; the tracker is idle afterwards whatever happened.
    pub fn release(&mut self, position: Vec2) -> PointerRelease {
        let result = if self.state == PointerState::MouseDown && !self.left_canvas {
            PointerRelease::Click(position)
        } else {
            PointerRelease::Ignored
        };
        self.state = PointerState::Idle;
        self.left_canvas = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_motion_stays_a_click() {
        let mut tracker = PointerTracker::new(5.0);
        tracker.press(Vec2::new(100.0, 100.0));
        assert_eq!(tracker.motion(Vec2::new(104.0, 95.0)), None);
        assert_eq!(tracker.state(), PointerState::MouseDown);
        assert_eq!(
            tracker.release(Vec2::new(104.0, 95.0)),
            PointerRelease::Click(Vec2::new(104.0, 95.0))
        );
        assert_eq!(tracker.state(), PointerState::Idle);
    }

    #[test]
    fn threshold_is_per_axis_and_deltas_are_relative() {
        let mut tracker = PointerTracker::new(5.0);
        tracker.press(Vec2::new(0.0, 0.0));
        // 4px on both axes is more than 5px diagonally but not per axis.
        assert_eq!(tracker.motion(Vec2::new(4.0, 4.0)), None);
        assert_eq!(tracker.motion(Vec2::new(6.0, 0.0)), Some(Vec2::new(6.0, 0.0)));
        assert_eq!(tracker.state(), PointerState::Dragging);
        assert_eq!(tracker.motion(Vec2::new(8.0, 1.0)), Some(Vec2::new(2.0, 1.0)));
        assert_eq!(tracker.release(Vec2::new(8.0, 1.0)), PointerRelease::Ignored);
        assert_eq!(tracker.state(), PointerState::Idle);
    }

    #[test]
    fn leaving_canvas_suppresses_click_and_motion() {
        let mut tracker = PointerTracker::new(5.0);
        tracker.press(Vec2::ZERO);
        tracker.leave();
        assert!(tracker.left_canvas());
        assert_eq!(tracker.motion(Vec2::new(50.0, 0.0)), None);
        assert_eq!(tracker.release(Vec2::ZERO), PointerRelease::Ignored);
        assert!(!tracker.left_canvas());

        tracker.press(Vec2::ZERO);
        tracker.leave();
        tracker.enter();
        assert_eq!(tracker.release(Vec2::ZERO), PointerRelease::Click(Vec2::ZERO));
    }

    #[test]
    fn leave_while_idle_is_ignored() {
        let mut tracker = PointerTracker::new(5.0);
        tracker.leave();
        assert!(!tracker.left_canvas());
        assert_eq!(tracker.motion(Vec2::new(20.0, 20.0)), None);
        assert_eq!(tracker.release(Vec2::ZERO), PointerRelease::Ignored);
    }

    #[test]
    fn movement_keys() {
        let mut input = InputState::default();
        assert!(input.handle_key(KeyCode::KeyW, true));
        assert!(input.handle_key(KeyCode::KeyD, true));
        assert!(!input.handle_key(KeyCode::KeyQ, true));
        let movement = input.movement();
        assert!(movement.move_forward && movement.move_right);
        assert!(!movement.move_backward && !movement.move_left);
        input.handle_key(KeyCode::KeyW, false);
        assert!(!input.movement().move_forward);
        input.clear();
        assert!(!input.movement().any());
    }
}
