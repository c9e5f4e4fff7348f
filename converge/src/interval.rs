//! Delay policies between polls

use crate::error::ConfigError;
use rand::Rng;
use std::time::Duration;

/// Produces the delay before the next poll from the attempt number.
///
/// `BoundedExponential` doubles from `base` up to `max` and then applies a
/// multiplicative jitter in `[1 - jitter, 1 + jitter]` so that many
/// concurrent waits do not poll in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalStrategy {
    Fixed(Duration),
    BoundedExponential {
        base: Duration,
        max: Duration,
        jitter: f64,
    },
}

impl IntervalStrategy {
    pub fn fixed(interval: Duration) -> Self {
        IntervalStrategy::Fixed(interval)
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        IntervalStrategy::BoundedExponential {
            base,
            max,
            jitter: 0.0,
        }
    }

    /// Sets the jitter fraction. No effect on a fixed interval.
    pub fn with_jitter(self, fraction: f64) -> Self {
        match self {
            IntervalStrategy::BoundedExponential { base, max, .. } => {
                IntervalStrategy::BoundedExponential {
                    base,
                    max,
                    jitter: fraction,
                }
            }
            fixed => fixed,
        }
    }

    /// Delay after attempt `attempt` (1-based; 0 is treated as 1).
    pub fn next<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        match self {
            IntervalStrategy::Fixed(interval) => *interval,
            IntervalStrategy::BoundedExponential { base, max, jitter } => {
                let exponent = attempt.saturating_sub(1).min(31);
                let capped = base
                    .checked_mul(1u32 << exponent)
                    .map_or(*max, |delay| delay.min(*max));

                let jitter = clamp_jitter(*jitter);
                if jitter == 0.0 {
                    return capped;
                }

                let factor = rng.gen_range((1.0 - jitter)..=(1.0 + jitter));
                scale(capped, factor)
            }
        }
    }

    /// Longest delay this strategy can ever produce
    pub fn ceiling(&self) -> Duration {
        match self {
            IntervalStrategy::Fixed(interval) => *interval,
            IntervalStrategy::BoundedExponential { max, jitter, .. } => {
                scale(*max, 1.0 + clamp_jitter(*jitter))
            }
        }
    }

    /// Checks the parameters a [`WaitConfig`](crate::WaitConfig) build would
    /// reject. Strategies used outside a wait config, e.g. for retries, can
    /// be checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            IntervalStrategy::Fixed(interval) => {
                if interval.is_zero() {
                    return Err(ConfigError::ZeroPollInterval);
                }
            }
            IntervalStrategy::BoundedExponential { base, max, jitter } => {
                if base.is_zero() {
                    return Err(ConfigError::ZeroPollInterval);
                }
                if max < base {
                    return Err(ConfigError::InvertedBackoff {
                        base: *base,
                        max: *max,
                    });
                }
                if !jitter.is_finite() || !(0.0..=1.0).contains(jitter) {
                    return Err(ConfigError::InvalidJitter(*jitter));
                }
                if *jitter > 0.0
                    && Duration::try_from_secs_f64(max.as_secs_f64() * (1.0 + jitter)).is_err()
                {
                    return Err(ConfigError::IntervalOverflow { max: *max });
                }
            }
        }
        Ok(())
    }
}

/// Out-of-range fractions act as their nearest bound, NaN as no jitter
fn clamp_jitter(jitter: f64) -> f64 {
    if jitter.is_nan() {
        0.0
    } else {
        jitter.clamp(0.0, 1.0)
    }
}

/// `delay * factor` for a non-negative factor, saturating at `Duration::MAX`
fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

impl Default for IntervalStrategy {
    fn default() -> Self {
        IntervalStrategy::exponential(Duration::from_secs(1), Duration::from_secs(10))
            .with_jitter(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn fixed_interval_ignores_attempt() {
        let strategy = IntervalStrategy::fixed(Duration::from_secs(15));
        let mut rng = rng();

        for attempt in [1, 2, 10, u32::MAX] {
            assert_eq!(strategy.next(attempt, &mut rng), Duration::from_secs(15));
        }
    }

    #[test]
    fn exponential_doubles_until_max() {
        let strategy =
            IntervalStrategy::exponential(Duration::from_millis(500), Duration::from_secs(5));
        let mut rng = rng();

        let delays: Vec<_> = (1..=6).map(|n| strategy.next(n, &mut rng)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(5),
                Duration::from_secs(5),
            ]
        );
    }

    #[test]
    fn exponential_survives_huge_attempt_numbers() {
        let strategy = IntervalStrategy::exponential(Duration::from_secs(1), Duration::from_secs(30));
        let mut rng = rng();

        assert_eq!(strategy.next(0, &mut rng), Duration::from_secs(1));
        assert_eq!(strategy.next(u32::MAX, &mut rng), Duration::from_secs(30));
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let strategy = IntervalStrategy::exponential(Duration::from_secs(2), Duration::from_secs(2))
            .with_jitter(0.25);
        let mut rng = rng();

        for attempt in 1..200 {
            let delay = strategy.next(attempt, &mut rng);
            assert!(delay >= Duration::from_millis(1500), "{:?}", delay);
            assert!(delay <= Duration::from_millis(2500), "{:?}", delay);
        }
    }

    #[test]
    fn jitter_is_deterministic_for_a_seeded_source() {
        let strategy = IntervalStrategy::default();

        let first: Vec<_> = (1..10).map(|n| strategy.next(n, &mut rng())).collect();
        let second: Vec<_> = (1..10).map(|n| strategy.next(n, &mut rng())).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ceiling_accounts_for_jitter() {
        let strategy = IntervalStrategy::exponential(Duration::from_secs(1), Duration::from_secs(10))
            .with_jitter(0.5);
        assert_eq!(strategy.ceiling(), Duration::from_secs(15));
        assert_eq!(
            IntervalStrategy::fixed(Duration::from_secs(3)).ceiling(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn with_jitter_leaves_fixed_alone() {
        let strategy = IntervalStrategy::fixed(Duration::from_secs(3)).with_jitter(0.5);
        assert_eq!(strategy, IntervalStrategy::Fixed(Duration::from_secs(3)));
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        assert_eq!(
            IntervalStrategy::fixed(Duration::ZERO).validate(),
            Err(ConfigError::ZeroPollInterval)
        );
        assert_eq!(
            IntervalStrategy::exponential(Duration::from_secs(5), Duration::from_secs(1)).validate(),
            Err(ConfigError::InvertedBackoff {
                base: Duration::from_secs(5),
                max: Duration::from_secs(1),
            })
        );
        assert_eq!(
            IntervalStrategy::default().with_jitter(1.5).validate(),
            Err(ConfigError::InvalidJitter(1.5))
        );
        assert!(IntervalStrategy::default().with_jitter(f64::NAN).validate().is_err());
        assert!(IntervalStrategy::default().validate().is_ok());
    }

    #[test]
    fn jitter_above_one_never_goes_negative() {
        let strategy =
            IntervalStrategy::exponential(Duration::from_millis(10), Duration::from_millis(10))
                .with_jitter(1.5);
        let mut rng = rng();

        for attempt in 1..200 {
            assert!(strategy.next(attempt, &mut rng) <= Duration::from_millis(20));
        }
        assert_eq!(strategy.ceiling(), Duration::from_millis(20));
    }

    #[test]
    fn huge_max_saturates_instead_of_overflowing() {
        let strategy =
            IntervalStrategy::exponential(Duration::from_secs(u64::MAX / 2), Duration::MAX)
                .with_jitter(0.5);
        let mut rng = rng();

        for attempt in 1..50 {
            assert!(strategy.next(attempt, &mut rng) > Duration::from_secs(u64::MAX / 8));
        }
        assert_eq!(strategy.ceiling(), Duration::MAX);
        assert_eq!(
            strategy.validate(),
            Err(ConfigError::IntervalOverflow { max: Duration::MAX })
        );
        assert!(
            IntervalStrategy::exponential(Duration::from_secs(1), Duration::MAX)
                .validate()
                .is_ok()
        );
    }
}
