// self
use crate::{_prelude::*, middleware::StatusRecord, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by crate operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("apikit.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Logs a failed attempt right before the executor sleeps and tries again.
pub fn log_retry_scheduled(next_attempt: u32, delay: Duration, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		next_attempt,
		delay_ms = whole_millis(delay),
		%error,
		"Operation failed; retrying."
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (next_attempt, delay, error);
	}
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn whole_millis(delay: Duration) -> u64 {
	u64::try_from(delay.whole_milliseconds().max(0)).unwrap_or(u64::MAX)
}

/// Logs why the auth gate refused a request. The credential itself is never logged.
pub fn log_auth_rejection(cookie: &str, reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(cookie, reason, "Request rejected by token gate.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (cookie, reason);
	}
}

/// Emits the access-log line for a completed request.
pub fn log_request(record: &StatusRecord) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		upgrade = record.upgrade.as_deref(),
		"{} [{}] - {}",
		record.method,
		record.uri,
		record.status.as_u16()
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = record;
	}
}
