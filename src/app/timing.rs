use std::time::{Duration, Instant};

/// Upper bound for one simulation step, so a stalled frame does not teleport
/// the camera.
const MAX_FRAME_DT: f32 = 0.1;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    pub frame_dt: f32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            frame_dt: 1.0 / 60.0,
        }
    }

    /// Records a frame at `now` and returns the elapsed seconds since the last one.
    pub fn update(&mut self, now: Instant) -> f32 {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().clamp(0.0, MAX_FRAME_DT);
        self.frame_dt
    }

    /// Forgets the previous frame, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.last_frame_time = None;
    }
}
