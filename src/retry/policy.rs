//! Exponential backoff policy consumed by the retry executor.

// std
use std::num::NonZeroU32;
// self
use crate::{_prelude::*, error::ConfigError};

/// Attempt budget and backoff curve for [`retry`](crate::retry::retry) and
/// [`retry_async`](crate::retry::retry_async).
///
/// The delay slept before attempt `i` (zero-indexed, `i >= 1`) is
/// `initial_delay * backoff_multiplier^(i - 1)`, saturating at [`Duration::MAX`] and clamped to
/// `max_delay` when one is configured. The first attempt never waits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
	max_attempts: NonZeroU32,
	initial_delay: Duration,
	backoff_multiplier: f64,
	max_delay: Option<Duration>,
}
impl RetryPolicy {
	/// Attempt budget used when none is configured.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
	/// Delay before the second attempt when none is configured.
	pub const DEFAULT_INITIAL_DELAY: Duration = Duration::SECOND;
	/// Growth factor applied between consecutive delays when none is configured.
	pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

	/// Returns a builder seeded with the default curve (1 second, doubling).
	pub fn builder() -> RetryPolicyBuilder {
		RetryPolicyBuilder::default()
	}

	/// Builds a doubling policy starting at one second with the provided attempt budget.
	pub fn new(max_attempts: u32) -> Result<Self, ConfigError> {
		Self::builder().max_attempts(max_attempts).build()
	}

	/// Maximum number of invocations, including the first.
	pub fn max_attempts(&self) -> NonZeroU32 {
		self.max_attempts
	}

	/// Delay slept before the second attempt.
	pub fn initial_delay(&self) -> Duration {
		self.initial_delay
	}

	/// Growth factor applied between consecutive delays.
	pub fn backoff_multiplier(&self) -> f64 {
		self.backoff_multiplier
	}

	/// Upper bound applied to every delay, if any.
	pub fn max_delay(&self) -> Option<Duration> {
		self.max_delay
	}

	/// Delay slept before the zero-indexed `attempt`; zero for the first attempt.
	pub fn delay_before(&self, attempt: u32) -> Duration {
		if attempt == 0 {
			return Duration::ZERO;
		}

		let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
		let seconds = self.initial_delay.as_seconds_f64() * self.backoff_multiplier.powi(exponent);
		let delay = Duration::saturating_seconds_f64(seconds);

		match self.max_delay {
			Some(cap) if delay > cap => cap,
			_ => delay,
		}
	}

	/// Every delay the policy can sleep, in order: one entry per retry after the first attempt.
	pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
		(1..self.max_attempts.get()).map(|attempt| self.delay_before(attempt))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: NonZeroU32::MIN.saturating_add(Self::DEFAULT_MAX_ATTEMPTS - 1),
			initial_delay: Self::DEFAULT_INITIAL_DELAY,
			backoff_multiplier: Self::DEFAULT_BACKOFF_MULTIPLIER,
			max_delay: None,
		}
	}
}

/// Builder for [`RetryPolicy`].
#[derive(Clone, Debug)]
pub struct RetryPolicyBuilder {
	max_attempts: u32,
	initial_delay: Duration,
	backoff_multiplier: f64,
	max_delay: Option<Duration>,
}
impl RetryPolicyBuilder {
	/// Sets the maximum number of invocations, including the first. Must be at least one.
	pub fn max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;

		self
	}

	/// Sets the delay slept before the second attempt. Must not be negative.
	pub fn initial_delay(mut self, delay: Duration) -> Self {
		self.initial_delay = delay;

		self
	}

	/// Sets the growth factor between consecutive delays. Must be finite and positive.
	pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
		self.backoff_multiplier = multiplier;

		self
	}

	/// Caps every delay at the provided duration. Must not be negative.
	pub fn max_delay(mut self, cap: Duration) -> Self {
		self.max_delay = Some(cap);

		self
	}

	/// Validates the configuration and produces a [`RetryPolicy`].
	pub fn build(self) -> Result<RetryPolicy, ConfigError> {
		let max_attempts = NonZeroU32::new(self.max_attempts).ok_or(ConfigError::ZeroAttempts)?;

		if self.initial_delay.is_negative() {
			return Err(ConfigError::InvalidBackoff { reason: "initial delay is negative" });
		}
		if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 0.0 {
			return Err(ConfigError::InvalidBackoff {
				reason: "multiplier must be finite and positive",
			});
		}
		if self.max_delay.is_some_and(Duration::is_negative) {
			return Err(ConfigError::InvalidBackoff { reason: "maximum delay is negative" });
		}

		Ok(RetryPolicy {
			max_attempts,
			initial_delay: self.initial_delay,
			backoff_multiplier: self.backoff_multiplier,
			max_delay: self.max_delay,
		})
	}
}
impl Default for RetryPolicyBuilder {
	fn default() -> Self {
		Self {
			max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
			initial_delay: RetryPolicy::DEFAULT_INITIAL_DELAY,
			backoff_multiplier: RetryPolicy::DEFAULT_BACKOFF_MULTIPLIER,
			max_delay: None,
		}
	}
}
