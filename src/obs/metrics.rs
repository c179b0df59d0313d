// crates.io
use axum::http::StatusCode;
// self
use crate::{
	_prelude::*,
	obs::{OpKind, OpOutcome},
};

/// Bumps `apikit_op_total{op, outcome}`.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("apikit_op_total", "op" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Feeds the backoff about to be slept into `apikit_retry_delay_seconds`.
pub fn record_retry_delay(delay: Duration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("apikit_retry_delay_seconds").record(delay.as_seconds_f64());

	#[cfg(not(feature = "metrics"))]
	let _ = delay;
}

/// Bumps `apikit_http_responses_total{class}` where `class` is `1xx` through `5xx`.
pub fn record_response_status(status: StatusCode) {
	#[cfg(feature = "metrics")]
	metrics::counter!("apikit_http_responses_total", "class" => status_class(status)).increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = status;
}

#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
fn status_class(status: StatusCode) -> &'static str {
	match status.as_u16() / 100 {
		1 => "1xx",
		2 => "2xx",
		3 => "3xx",
		4 => "4xx",
		_ => "5xx",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn statuses_bucket_by_class() {
		assert_eq!(status_class(StatusCode::SWITCHING_PROTOCOLS), "1xx");
		assert_eq!(status_class(StatusCode::NO_CONTENT), "2xx");
		assert_eq!(status_class(StatusCode::UNAUTHORIZED), "4xx");
		assert_eq!(status_class(StatusCode::BAD_GATEWAY), "5xx");
	}

	#[test]
	fn hooks_run_without_a_recorder() {
		record_op_outcome(OpKind::Auth, OpOutcome::Rejected);
		record_retry_delay(Duration::milliseconds(250));
		record_response_status(StatusCode::OK);
	}
}
