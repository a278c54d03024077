//! Decorative drift shown while a remote shape is being generated.
//!
//! A cubic ease-in over a long window: the spring firms up from very weak,
//! noise eases down, and abstraction gets a nudge that fades as the ramp
//! progresses.  The window is far longer than typical remote latency, so the
//! drift is almost always cancelled before it completes.

use crate::config::AnticipationConfig;

use super::easing::{ease_in_cubic, lerp, progress};
use super::state::Levels;

#[derive(Debug, Default)]
pub struct AnticipationDrift {
    config: AnticipationConfig,
    active: bool,
    elapsed: f32,
}

impl AnticipationDrift {
    pub fn new(config: AnticipationConfig) -> Self {
        Self {
            config,
            active: false,
            elapsed: 0.0,
        }
    }

    /// Restart the ramp from zero.
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
    }

    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.elapsed = 0.0;
        was_active
    }

    pub fn advance(&mut self, dt: f32) {
        if self.active {
            self.elapsed += dt;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn eased(&self) -> f32 {
        ease_in_cubic(progress(self.elapsed, self.config.ramp_secs))
    }

    /// Spring/noise for this frame; empty when inactive.
    ///
    /// Holds the end values once the ramp completes.
    pub fn levels(&self) -> Levels {
        if !self.active {
            return Levels::NONE;
        }
        let e = self.eased();
        Levels {
            spring: Some(lerp(self.config.spring_start, self.config.spring_end, e)),
            noise: Some(lerp(self.config.noise_start, self.config.noise_end, e)),
        }
    }

    /// Extra abstraction on top of the crystallised value; largest early on.
    pub fn abstraction_nudge(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.config.abstraction_boost * (1.0 - self.eased())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_contributes_nothing() {
        let d = AnticipationDrift::new(AnticipationConfig::default());
        assert_eq!(d.levels(), Levels::NONE);
        assert_eq!(d.abstraction_nudge(), 0.0);
    }

    #[test]
    fn ramp_starts_weak_and_noisy() {
        let mut d = AnticipationDrift::new(AnticipationConfig::default());
        d.start();
        let l = d.levels();
        assert_eq!(l.spring, Some(0.3));
        assert_eq!(l.noise, Some(1.0));
        assert!((d.abstraction_nudge() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn ramp_is_slow_early() {
        let mut d = AnticipationDrift::new(AnticipationConfig::default());
        d.start();
        d.advance(5.0); // quarter of the window, eased to 1/64
        let spring = d.levels().spring.unwrap();
        assert!(spring < 0.31);
        assert!(d.abstraction_nudge() > 0.19);
    }

    #[test]
    fn ramp_holds_end_values() {
        let mut d = AnticipationDrift::new(AnticipationConfig::default());
        d.start();
        d.advance(60.0);
        let l = d.levels();
        assert!((l.spring.unwrap() - 0.6).abs() < 1e-6);
        assert!((l.noise.unwrap() - 0.6).abs() < 1e-6);
        assert_eq!(d.abstraction_nudge(), 0.0);
    }

    #[test]
    fn cancel_clears_contribution() {
        let mut d = AnticipationDrift::new(AnticipationConfig::default());
        d.start();
        d.advance(3.0);
        assert!(d.cancel());
        assert_eq!(d.levels(), Levels::NONE);
        assert!(!d.cancel());
    }

    #[test]
    fn restart_resets_the_ramp() {
        let mut d = AnticipationDrift::new(AnticipationConfig::default());
        d.start();
        d.advance(10.0);
        d.start();
        assert_eq!(d.elapsed(), 0.0);
    }
}
