//! Serializable description of a finite retry schedule.

use crate::errors::{Result, TransflowError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^retry
    #[default]
    Exponential,
    /// delay = base * (retry + 1)
    Linear,
    /// delay = base
    Constant,
    /// delay = base * fib(retry + 1)
    Fibonacci,
}

/// Jitter strategy to spread out concurrent retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
}

impl JitterStrategy {
    /// Applies the jitter to one delay.
    #[must_use]
    pub fn apply(self, delay: Duration) -> Duration {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        let jittered = match self {
            Self::None => nanos,
            Self::Full => {
                if nanos == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=nanos)
                }
            }
            Self::Equal => {
                let half = nanos / 2;
                if half == 0 {
                    nanos
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };
        Duration::from_nanos(jittered)
    }
}

/// Configuration for a finite retry schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base delay between attempts in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Jitter strategy.
    pub jitter: JitterStrategy,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff: BackoffStrategy::Exponential,
            jitter: JitterStrategy::Full,
        }
    }
}

impl ScheduleConfig {
    /// Creates a new schedule config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TransflowError::message(format!("Invalid schedule config: {e}")))
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Calculates the wait before retry number `retry` (0-indexed), before jitter.
    #[must_use]
    pub fn base_delay_for(&self, retry: usize) -> Duration {
        let base = self.base_delay_ms;
        let delay = match self.backoff {
            BackoffStrategy::Exponential => {
                let exponent = u32::try_from(retry).unwrap_or(u32::MAX);
                base.saturating_mul(2u64.saturating_pow(exponent))
            }
            BackoffStrategy::Linear => {
                let step = u64::try_from(retry).unwrap_or(u64::MAX).saturating_add(1);
                base.saturating_mul(step)
            }
            BackoffStrategy::Constant => base,
            BackoffStrategy::Fibonacci => base.saturating_mul(fibonacci(retry.saturating_add(1))),
        };
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Calculates the wait before retry number `retry` (0-indexed), with jitter.
    #[must_use]
    pub fn delay_for(&self, retry: usize) -> Duration {
        self.jitter.apply(self.base_delay_for(retry))
    }
}

fn fibonacci(n: usize) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        if a == u64::MAX {
            break;
        }
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}
