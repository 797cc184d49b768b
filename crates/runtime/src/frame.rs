use foundation::time::Time;

/// Frame metadata handed to every per-tick system.
///
/// Frames advance by whatever `dt` the host's frame callback reports, so the
/// loop can be driven at display rate or replayed with fixed steps.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Engine time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn first(dt_s: f64) -> Self {
        Self {
            index: 0,
            dt_s: sanitize_dt(dt_s),
            time: Time::ZERO,
        }
    }

    /// Next frame with a new delta; time advances by this frame's delta.
    pub fn advance(self, dt_s: f64) -> Self {
        Self {
            index: self.index + 1,
            dt_s: sanitize_dt(dt_s),
            time: self.time.advanced(self.dt_s),
        }
    }
}

/// Large gaps (tab in background, debugger pause) are capped so animation
/// phases do not jump.
pub const MAX_FRAME_DT_S: f64 = 0.25;

fn sanitize_dt(dt_s: f64) -> f64 {
    if dt_s.is_finite() && dt_s > 0.0 {
        dt_s.min(MAX_FRAME_DT_S)
    } else {
        0.0
    }
}
