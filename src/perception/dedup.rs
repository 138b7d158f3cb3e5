use std::time::Duration;

use crate::config::PacingConfig;

/// Judges two encoded frames visually similar when their payload lengths
/// differ by less than `threshold_pct` percent of their average length.
///
/// This is deliberately a length-only proxy: exact-bit comparison would
/// flag benign encoding noise, while a length delta tolerates minor
/// overlay flicker. It can false-positive on large but visually trivial
/// diffs and false-negative on small meaningful ones (a blinking cursor);
/// the streak cap in the engine bounds how long a misjudgement can stall
/// the loop.
pub fn frames_are_similar(a: &[u8], b: &[u8], threshold_pct: f64) -> bool {
    let avg = (a.len() + b.len()) as f64 / 2.0;
    if avg == 0.0 {
        return true;
    }
    let delta_pct = (a.len() as f64 - b.len() as f64).abs() / avg * 100.0;
    delta_pct < threshold_pct
}

/// Nap length for the `streak`-th consecutive static frame: grows by a
/// fixed step per streak, capped.
pub fn static_nap(pacing: &PacingConfig, streak: u32) -> Duration {
    let ms = (pacing.static_nap_step_ms * streak as u64).min(pacing.static_nap_cap_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_payloads_are_similar() {
        let frame = vec![7u8; 4096];
        assert!(frames_are_similar(&frame, &frame, 1.0));
    }

    #[test]
    fn test_small_length_delta_is_similar() {
        let a = vec![0u8; 10_000];
        let b = vec![0u8; 10_050]; // 0.5% of the average
        assert!(frames_are_similar(&a, &b, 1.0));
    }

    #[test]
    fn test_threshold_exceeding_delta_is_dissimilar() {
        let a = vec![0u8; 10_000];
        let b = vec![0u8; 11_000]; // ~9.5% of the average
        assert!(!frames_are_similar(&a, &b, 1.0));
    }

    #[test]
    fn test_empty_payloads_compare_similar() {
        assert!(frames_are_similar(&[], &[], 1.0));
    }

    #[test]
    fn test_nap_grows_with_streak_and_caps() {
        let pacing = PacingConfig::default();
        assert_eq!(static_nap(&pacing, 1), Duration::from_millis(2000));
        assert_eq!(static_nap(&pacing, 2), Duration::from_millis(4000));
        assert_eq!(static_nap(&pacing, 5), Duration::from_millis(10_000));
        assert_eq!(static_nap(&pacing, 50), Duration::from_millis(10_000));
    }
}
