use std::time::Duration;

use rand::Rng;

use crate::config::ReconnectConfig;

/// Exponential backoff with optional full jitter. The attempt counter resets
/// after every successful connect.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next reconnect attempt, or `None` once retries are
    /// disabled or exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.config.enabled {
            return None;
        }
        if self.config.max_attempts != 0 && self.attempts >= self.config.max_attempts {
            return None;
        }
        self.attempts += 1;

        let delay = self.ceiling(self.attempts);
        if self.config.jitter {
            let millis = delay.as_millis().max(1) as u64;
            return Some(Duration::from_millis(rand::thread_rng().gen_range(0..millis)));
        }
        Some(delay)
    }

    /// Un-jittered delay for the given attempt (1-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let power = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = self.config.base_delay().as_secs_f64();
        let max = self.config.max_delay().as_secs_f64();
        let secs = (base * self.config.multiplier.powi(power)).min(max);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            self.config.base_delay()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(max_attempts: u32) -> ReconnectConfig {
        ReconnectConfig {
            enabled: true,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            multiplier: 2.0,
            max_attempts,
            jitter: false,
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let mut backoff = Backoff::new(fixed(0));
        let delays: Vec<u128> = (0..6)
            .map(|_| backoff.next_delay().unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut backoff = Backoff::new(fixed(3));
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
        assert_eq!(backoff.attempts(), 3);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_disabled_never_retries() {
        let mut backoff = Backoff::new(ReconnectConfig::disabled());
        assert!(backoff.next_delay().is_none());
    }

    #[test]
    fn test_jitter_stays_below_ceiling() {
        let mut backoff = Backoff::new(ReconnectConfig {
            jitter: true,
            ..fixed(0)
        });
        for attempt in 1..=20 {
            let delay = backoff.next_delay().unwrap();
            assert!(delay < backoff.ceiling(attempt));
        }
    }

    #[test]
    fn test_huge_attempt_counts_do_not_overflow() {
        let backoff = Backoff::new(fixed(0));
        assert_eq!(backoff.ceiling(u32::MAX), Duration::from_millis(1_000));
    }
}
