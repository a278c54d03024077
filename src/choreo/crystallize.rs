//! Temporal crystallisation: the abstraction level chases its target.

/// Exponential approach toward the most recently set target abstraction.
///
/// ```
/// use lumen_choreo::choreo::AbstractionLerp;
///
/// let mut lerp = AbstractionLerp::new(2.0, 0.5);
/// lerp.set_target(0.0);
/// lerp.advance(0.25);
/// assert!((lerp.current() - 0.25).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AbstractionLerp {
    rate: f32,
    current: f32,
    target: f32,
    engaged: bool,
}

impl AbstractionLerp {
    pub fn new(rate: f32, baseline: f32) -> Self {
        let baseline = baseline.clamp(0.0, 1.0);
        Self {
            rate,
            current: baseline,
            target: baseline,
            engaged: false,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
        self.engaged = true;
    }

    /// Shift the target by `delta`, clamped to `[0, 1]`.
    pub fn nudge_target(&mut self, delta: f32) {
        self.set_target(self.target + delta);
    }

    /// Move the target `step` of the way toward `goal`.
    pub fn drift_toward(&mut self, goal: f32, step: f32) {
        let step = step.clamp(0.0, 1.0);
        self.set_target(self.target + (goal - self.target) * step);
    }

    pub fn advance(&mut self, dt: f32) {
        let k = (self.rate * dt).clamp(0.0, 1.0);
        if k >= 1.0 {
            self.current = self.target;
        } else {
            self.current += (self.target - self.current) * k;
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Value for the abstraction override; `None` until something has set a
    /// target.
    pub fn override_value(&self) -> Option<f32> {
        self.engaged.then_some(self.current)
    }

    /// Snap back to `baseline` and stop overriding.
    pub fn reset(&mut self, baseline: f32) {
        let baseline = baseline.clamp(0.0, 1.0);
        self.current = baseline;
        self.target = baseline;
        self.engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_lerp_does_not_override() {
        let mut l = AbstractionLerp::new(2.0, 0.5);
        l.advance(1.0);
        assert_eq!(l.override_value(), None);
        assert_eq!(l.current(), 0.5);
    }

    #[test]
    fn approaches_target_without_overshoot() {
        let mut l = AbstractionLerp::new(2.0, 0.5);
        l.set_target(1.0);
        let mut prev = l.current();
        for _ in 0..200 {
            l.advance(0.016);
            assert!(l.current() >= prev);
            assert!(l.current() <= 1.0);
            prev = l.current();
        }
        assert!((l.current() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn large_dt_snaps_to_target() {
        let mut l = AbstractionLerp::new(2.0, 0.5);
        l.set_target(0.1);
        l.advance(5.0);
        assert_eq!(l.current(), 0.1);

        // Exactly one rate period also lands on the target.
        l.set_target(0.7);
        l.advance(0.5);
        assert_eq!(l.current(), 0.7);
    }

    #[test]
    fn drift_and_nudge_clamp() {
        let mut l = AbstractionLerp::new(2.0, 0.5);
        l.drift_toward(1.0, 0.2);
        assert!((l.target() - 0.6).abs() < 1e-6);
        l.nudge_target(2.0);
        assert_eq!(l.target(), 1.0);
        l.nudge_target(-5.0);
        assert_eq!(l.target(), 0.0);
    }

    #[test]
    fn reset_stops_overriding() {
        let mut l = AbstractionLerp::new(2.0, 0.5);
        l.set_target(0.2);
        l.advance(0.1);
        assert!(l.override_value().is_some());
        l.reset(0.5);
        assert_eq!(l.override_value(), None);
        assert_eq!(l.target(), 0.5);
    }
}
