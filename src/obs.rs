//! Optional observability hooks shared by the retry executor, the auth gate, and the HTTP layers.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit spans named `apikit.op` with the `op` and `stage`
//!   fields, plus the per-event logs documented on each hook.
//! - Enable `metrics` to increment the `apikit_op_total` counter for every
//!   attempt/success/failure/rejection, labeled by `op` + `outcome`. Retry backoffs land in the
//!   `apikit_retry_delay_seconds` histogram and recorded responses in
//!   `apikit_http_responses_total`, labeled by status class.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Retry executor loop.
	Retry,
	/// Cookie token gate.
	Auth,
	/// Request completed through a status-recording layer.
	Http,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Retry => "retry",
			OpKind::Auth => "auth",
			OpKind::Http => "http",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// A single invocation was started.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Request refused before reaching the wrapped handler.
	Rejected,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::Rejected => "rejected",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
