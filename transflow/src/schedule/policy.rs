//! Lazy, restartable sequences of wait durations.

use super::{JitterStrategy, ScheduleConfig};
use std::fmt;
use std::iter;
use std::sync::Arc;
use std::time::Duration;

/// A lazily produced sequence of delays.
pub type Delays = Box<dyn Iterator<Item = Duration> + Send>;

/// A restartable sequence of waits between attempts.
///
/// Each call to [`Schedule::iter`] starts the sequence from the beginning, so
/// one schedule can drive any number of retry loops. Infinite schedules are
/// never materialized.
#[derive(Clone)]
pub struct Schedule {
    factory: Arc<dyn Fn() -> Delays + Send + Sync>,
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule").finish_non_exhaustive()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::never()
    }
}

impl From<Vec<Duration>> for Schedule {
    fn from(delays: Vec<Duration>) -> Self {
        Self::from_durations(delays)
    }
}

impl From<&ScheduleConfig> for Schedule {
    fn from(config: &ScheduleConfig) -> Self {
        Self::from_config(config)
    }
}

impl Schedule {
    /// Builds a schedule from an iterator factory.
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = Duration> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || Box::new(factory()) as Delays),
        }
    }

    /// No retries.
    #[must_use]
    pub fn never() -> Self {
        Self::from_fn(iter::empty)
    }

    /// One retry after `delay`.
    #[must_use]
    pub fn once(delay: Duration) -> Self {
        Self::from_fn(move || iter::once(delay))
    }

    /// `count` immediate retries.
    #[must_use]
    pub fn recurs(count: usize) -> Self {
        Self::from_fn(move || iter::repeat(Duration::ZERO).take(count))
    }

    /// Immediate retries without end.
    #[must_use]
    pub fn forever() -> Self {
        Self::from_fn(|| iter::repeat(Duration::ZERO))
    }

    /// Retries without end, waiting `delay` each time.
    #[must_use]
    pub fn spaced(delay: Duration) -> Self {
        Self::from_fn(move || iter::repeat(delay))
    }

    /// An explicit finite list of delays.
    pub fn from_durations(delays: impl IntoIterator<Item = Duration>) -> Self {
        let delays: Arc<[Duration]> = delays.into_iter().collect();
        Self::from_fn(move || {
            let delays = Arc::clone(&delays);
            (0..delays.len()).map(move |i| delays[i])
        })
    }

    /// `base`, `2 * base`, `3 * base`, ... without end.
    #[must_use]
    pub fn linear(base: Duration) -> Self {
        Self::from_fn(move || iter::successors(Some(base), move |d| Some(d.saturating_add(base))))
    }

    /// `base`, `base * factor`, `base * factor^2`, ... without end.
    #[must_use]
    pub fn exponential(base: Duration, factor: u32) -> Self {
        Self::from_fn(move || iter::successors(Some(base), move |d| Some(d.saturating_mul(factor))))
    }

    /// `base`, `base`, `2 * base`, `3 * base`, `5 * base`, ... without end.
    #[must_use]
    pub fn fibonacci(base: Duration) -> Self {
        Self::from_fn(move || {
            iter::successors(Some((base, base)), |(a, b)| Some((*b, a.saturating_add(*b))))
                .map(|(a, _)| a)
        })
    }

    /// A finite schedule described by `config`, with jitter applied per delay.
    #[must_use]
    pub fn from_config(config: &ScheduleConfig) -> Self {
        let config = config.clone();
        Self::from_fn(move || {
            let config = config.clone();
            (0..config.max_retries).map(move |retry| config.delay_for(retry))
        })
    }

    /// Limits the schedule to at most `count` retries.
    #[must_use]
    pub fn take(self, count: usize) -> Self {
        Self::from_fn(move || self.iter().take(count))
    }

    /// Caps every delay at `cap`.
    #[must_use]
    pub fn max_delay(self, cap: Duration) -> Self {
        Self::from_fn(move || self.iter().map(move |d| d.min(cap)))
    }

    /// Stops once the total waited time would exceed `budget`.
    #[must_use]
    pub fn max_cumulative(self, budget: Duration) -> Self {
        Self::from_fn(move || {
            self.iter().scan(Duration::ZERO, move |spent, d| {
                let total = spent.checked_add(d)?;
                if total > budget {
                    return None;
                }
                *spent = total;
                Some(d)
            })
        })
    }

    /// Runs this schedule to its end, then `other`.
    #[must_use]
    pub fn then(self, other: Self) -> Self {
        Self::from_fn(move || self.iter().chain(other.iter()))
    }

    /// Randomizes every delay with `strategy`.
    #[must_use]
    pub fn jitter(self, strategy: JitterStrategy) -> Self {
        Self::from_fn(move || self.iter().map(move |d| strategy.apply(d)))
    }

    /// Starts a fresh pass over the delays.
    #[must_use]
    pub fn iter(&self) -> Delays {
        (self.factory)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn test_schedule_restarts() {
        let schedule = Schedule::from_durations(ms(&[1, 2]));
        assert_eq!(schedule.iter().collect::<Vec<_>>(), ms(&[1, 2]));
        assert_eq!(schedule.iter().collect::<Vec<_>>(), ms(&[1, 2]));
    }

    #[test]
    fn test_finite_constructors() {
        assert_eq!(Schedule::never().iter().count(), 0);
        assert_eq!(Schedule::recurs(3).iter().collect::<Vec<_>>(), ms(&[0, 0, 0]));
        assert_eq!(Schedule::once(Duration::from_millis(7)).iter().collect::<Vec<_>>(), ms(&[7]));
    }

    #[test]
    fn test_infinite_constructors_are_lazy() {
        let base = Duration::from_millis(10);
        assert_eq!(Schedule::linear(base).iter().take(3).collect::<Vec<_>>(), ms(&[10, 20, 30]));
        assert_eq!(
            Schedule::exponential(base, 2).iter().take(4).collect::<Vec<_>>(),
            ms(&[10, 20, 40, 80])
        );
        assert_eq!(
            Schedule::fibonacci(base).iter().take(5).collect::<Vec<_>>(),
            ms(&[10, 10, 20, 30, 50])
        );
        assert_eq!(Schedule::forever().iter().take(1000).count(), 1000);
        assert_eq!(Schedule::spaced(base).take(2).iter().collect::<Vec<_>>(), ms(&[10, 10]));
    }

    #[test]
    fn test_combinators() {
        let base = Duration::from_millis(10);
        let capped = Schedule::exponential(base, 10).max_delay(Duration::from_millis(500)).take(4);
        assert_eq!(capped.iter().collect::<Vec<_>>(), ms(&[10, 100, 500, 500]));

        let budgeted = Schedule::spaced(base).max_cumulative(Duration::from_millis(35));
        assert_eq!(budgeted.iter().collect::<Vec<_>>(), ms(&[10, 10, 10]));

        let chained = Schedule::recurs(1).then(Schedule::once(base));
        assert_eq!(chained.iter().collect::<Vec<_>>(), ms(&[0, 10]));
    }

    #[test]
    fn test_exponential_saturates() {
        let mut delays = Schedule::exponential(Duration::from_secs(1), u32::MAX).iter();
        delays.nth(10);
        assert_eq!(delays.next(), Some(Duration::MAX));
    }

    #[test]
    fn test_from_config() {
        let config = ScheduleConfig::new()
            .with_max_retries(3)
            .with_base_delay_ms(100)
            .with_jitter(JitterStrategy::None);
        assert_eq!(Schedule::from_config(&config).iter().collect::<Vec<_>>(), ms(&[100, 200, 400]));
    }
}
