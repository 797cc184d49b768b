use crate::frame::Frame;

/// Run state of a frame-callback driven loop.
///
/// The loop owns the frame counter; hosts call `tick` from their frame
/// callback and stop requesting frames once `tick` returns `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationLoop {
    state: LoopState,
    last: Option<Frame>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            last: None,
        }
    }

    pub fn start(&mut self) {
        self.state = LoopState::Running;
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last
    }

    pub fn tick(&mut self, dt_s: f64) -> Option<Frame> {
        if !self.is_running() {
            return None;
        }
        let frame = match self.last {
            Some(prev) => prev.advance(dt_s),
            None => Frame::first(dt_s),
        };
        self.last = Some(frame);
        Some(frame)
    }
}

/// Phase accumulator for a periodic per-object effect.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Pulse {
    /// Accumulated phase (radians).
    pub phase: f64,
    /// Phase velocity (radians per second).
    pub rate: f64,
}

impl Pulse {
    pub fn new(rate: f64) -> Self {
        Self { phase: 0.0, rate }
    }

    pub fn advance(&mut self, dt_s: f64) {
        self.phase = (self.phase + self.rate * dt_s).rem_euclid(std::f64::consts::TAU);
    }

    /// `0.5 + 0.5 * sin(phase)`, in `[0, 1]`.
    pub fn wave(&self) -> f64 {
        0.5 + 0.5 * self.phase.sin()
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationLoop, Pulse};

    #[test]
    fn stopped_loop_produces_no_frames() {
        let mut lp = AnimationLoop::new();
        assert_eq!(lp.tick(0.016), None);
        lp.start();
        let f0 = lp.tick(0.016).unwrap();
        let f1 = lp.tick(0.016).unwrap();
        assert_eq!((f0.index, f1.index), (0, 1));
        lp.stop();
        assert_eq!(lp.tick(0.016), None);
        assert_eq!(lp.last_frame(), Some(f1));
    }

    #[test]
    fn pulse_wraps_and_stays_in_unit_range() {
        let mut p = Pulse::new(2.3);
        for _ in 0..1000 {
            p.advance(0.05);
            assert!((0.0..std::f64::consts::TAU).contains(&p.phase));
            assert!((0.0..=1.0).contains(&p.wave()));
        }
    }
}
