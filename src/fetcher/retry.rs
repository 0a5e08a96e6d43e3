use rand::Rng;
use std::time::Duration;

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`
/// with ±20% jitter.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    // Cap the exponent so a misconfigured retry count can't overflow
    let factor = 2_u32.saturating_pow(attempt.min(10));
    let delay = base.saturating_mul(factor);

    let jitter = rand::thread_rng().gen_range(0.8..1.2);
    delay.mul_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(delay: Duration, expected_ms: u64) -> bool {
        let ms = delay.as_millis() as u64;
        ms >= expected_ms * 79 / 100 && ms <= expected_ms * 121 / 100
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(1);
        assert!(within(backoff_delay(0, base), 1_000));
        assert!(within(backoff_delay(1, base), 2_000));
        assert!(within(backoff_delay(2, base), 4_000));
    }

    #[test]
    fn test_backoff_cap() {
        let base = Duration::from_millis(10);
        assert!(within(backoff_delay(30, base), 10 * 1024));
    }

    #[test]
    fn test_zero_base_is_zero() {
        assert_eq!(backoff_delay(3, Duration::ZERO), Duration::ZERO);
    }
}
