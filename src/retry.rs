//! Generic retry loops with exponential backoff.
//!
//! [`retry`] drives a blocking operation and sleeps the calling thread between attempts;
//! [`retry_async`] drives a future-returning operation and yields to the runtime while it waits.
//! Both return the first success immediately. Once the attempt budget is exhausted they return
//! the error produced by the final attempt, unwrapped, so callers see the last failure reason
//! directly.

mod policy;

pub use policy::*;

// std
use std::{thread, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const KIND: OpKind = OpKind::Retry;

/// Invokes `operation` until it succeeds or `policy` runs out of attempts, blocking the current
/// thread between attempts.
///
/// Use [`retry_async`] inside async code; this function must not run on a cooperative
/// executor thread.
pub fn retry<T, E, F>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
	F: FnMut() -> Result<T, E>,
	E: Display,
{
	let _span = OpSpan::new(KIND, "retry").entered();
	let mut attempt = 0;

	loop {
		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		match operation() {
			Ok(value) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				return Ok(value);
			},
			Err(err) => {
				attempt += 1;

				if attempt >= policy.max_attempts().get() {
					obs::record_op_outcome(KIND, OpOutcome::Failure);

					return Err(err);
				}

				let delay = policy.delay_before(attempt);

				obs::log_retry_scheduled(attempt, delay, &err);
				obs::record_retry_delay(delay);
				thread::sleep(to_std(delay));
			},
		}
	}
}

/// Async counterpart of [`retry`]; waits with [`tokio::time::sleep`] so other tasks keep running.
///
/// Dropping the returned future abandons the remaining attempts.
pub async fn retry_async<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Display,
{
	let span = OpSpan::new(KIND, "retry_async");

	span.instrument(async move {
		let mut attempt = 0;

		loop {
			obs::record_op_outcome(KIND, OpOutcome::Attempt);

			match operation().await {
				Ok(value) => {
					obs::record_op_outcome(KIND, OpOutcome::Success);

					return Ok(value);
				},
				Err(err) => {
					attempt += 1;

					if attempt >= policy.max_attempts().get() {
						obs::record_op_outcome(KIND, OpOutcome::Failure);

						return Err(err);
					}

					let delay = policy.delay_before(attempt);

					obs::log_retry_scheduled(attempt, delay, &err);
					obs::record_retry_delay(delay);
					tokio::time::sleep(to_std(delay)).await;
				},
			}
		}
	})
	.await
}

fn to_std(delay: Duration) -> StdDuration {
	StdDuration::try_from(delay).unwrap_or_default()
}
