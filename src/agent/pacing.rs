use std::time::Duration;

use crate::config::PacingConfig;

/// Pacing state for the control loop: two independent feedback loops.
///
/// The adaptive delay is an additive idle penalty in
/// `[0, max_adaptive_ms]` — raised when the model yields no decision,
/// forced to its cap on a rate-limit signal, lowered on progress, and
/// decayed a little every quiet cycle. The backoff is a multiplicative
/// cooldown applied only to rate-limit errors that escape the decision
/// client, reset to its base by the first non-rate-limit cycle.
#[derive(Debug, Clone)]
pub struct Pacing {
    config: PacingConfig,
    adaptive_ms: u64,
    backoff_ms: u64,
}

impl Pacing {
    pub fn new(config: PacingConfig) -> Self {
        let backoff_ms = config.backoff_base_ms;
        Self {
            config,
            adaptive_ms: 0,
            backoff_ms,
        }
    }

    /// Sleep before the next cycle: `max(base + adaptive, floor)`.
    pub fn cycle_delay(&self) -> Duration {
        let total = (self.config.base_delay_ms + self.adaptive_ms).max(self.config.floor_ms);
        Duration::from_millis(total)
    }

    pub fn adaptive(&self) -> Duration {
        Duration::from_millis(self.adaptive_ms)
    }

    /// Progress: lower the idle penalty toward zero.
    pub fn reward(&mut self) {
        self.adaptive_ms = self.adaptive_ms.saturating_sub(self.config.recovery_ms);
    }

    /// No decision this cycle: raise the idle penalty toward the cap.
    pub fn penalize(&mut self) {
        self.adaptive_ms =
            (self.adaptive_ms + self.config.idle_penalty_ms).min(self.config.max_adaptive_ms);
    }

    /// Rate-limit cooldown: jump straight to the cap.
    pub fn penalize_to_max(&mut self) {
        self.adaptive_ms = self.config.max_adaptive_ms;
    }

    /// Small per-cycle recovery applied when the loop is not mid-execution.
    pub fn decay(&mut self) {
        self.adaptive_ms = self.adaptive_ms.saturating_sub(self.config.decay_ms);
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Grow the backoff multiplicatively up to its hard cap.
    pub fn grow_backoff(&mut self) {
        let grown = (self.backoff_ms as f64 * self.config.backoff_factor) as u64;
        self.backoff_ms = grown.min(self.config.backoff_cap_ms);
    }

    pub fn reset_backoff(&mut self) {
        self.backoff_ms = self.config.backoff_base_ms;
    }

    pub fn exec_poll(&self) -> Duration {
        Duration::from_millis(self.config.exec_poll_ms)
    }

    pub fn min_decision_interval(&self) -> Duration {
        Duration::from_millis(self.config.min_decision_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacing() -> Pacing {
        Pacing::new(PacingConfig::default())
    }

    #[test]
    fn test_adaptive_never_exceeds_cap() {
        let mut p = pacing();
        for _ in 0..100 {
            p.penalize();
        }
        assert_eq!(p.adaptive(), Duration::from_millis(10_000));
        assert_eq!(p.cycle_delay(), Duration::from_millis(14_000));
    }

    #[test]
    fn test_adaptive_never_goes_negative() {
        let mut p = pacing();
        p.penalize();
        for _ in 0..100 {
            p.reward();
            p.decay();
        }
        assert_eq!(p.adaptive(), Duration::ZERO);
        assert_eq!(p.cycle_delay(), Duration::from_millis(4000));
    }

    #[test]
    fn test_cycle_delay_respects_floor() {
        let mut cfg = PacingConfig::default();
        cfg.base_delay_ms = 200;
        cfg.floor_ms = 1000;
        let p = Pacing::new(cfg);
        assert_eq!(p.cycle_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_rate_limit_cooldown_jumps_to_max() {
        let mut p = pacing();
        p.penalize_to_max();
        assert_eq!(p.adaptive(), Duration::from_millis(10_000));
    }

    #[test]
    fn test_backoff_grows_strictly_until_cap() {
        let mut p = pacing();
        let mut previous = p.backoff();
        for _ in 0..4 {
            p.grow_backoff();
            assert!(p.backoff() > previous);
            previous = p.backoff();
        }
        for _ in 0..10 {
            p.grow_backoff();
        }
        assert_eq!(p.backoff(), Duration::from_millis(60_000));
    }

    #[test]
    fn test_backoff_resets_to_base() {
        let mut p = pacing();
        p.grow_backoff();
        p.grow_backoff();
        p.reset_backoff();
        assert_eq!(p.backoff(), Duration::from_millis(5000));
    }
}
