//! Response status recording around an inner service.

// std
use std::task::{Context, Poll};
// crates.io
use axum::{
	extract::Request,
	http::{HeaderMap, Method, StatusCode, Uri, header},
	response::Response,
};
use tower::{Layer, Service};
// self
use crate::{
	_prelude::*,
	obs::{self, OpKind, OpOutcome},
};

type RecordFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

/// What the wrapped service answered for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRecord {
	/// Request method.
	pub method: Method,
	/// Request URI as received.
	pub uri: Uri,
	/// Status the inner service answered with; 200 unless it set another one.
	pub status: StatusCode,
	/// Protocol named in `Upgrade` when the request asked for a connection upgrade.
	pub upgrade: Option<String>,
}

/// Access-log layer: records every response status and logs
/// `"{method} [{uri}] - {status}"` at `info` level.
pub type LogLayer = RecordStatusLayer<fn(&StatusRecord)>;

/// Builds the access-log [`LogLayer`].
pub fn log_layer() -> LogLayer {
	RecordStatusLayer::new(obs::log_request as fn(&StatusRecord))
}

/// Layer producing [`RecordStatus`] services that hand a [`StatusRecord`] to `sink` once the
/// inner service has answered.
pub struct RecordStatusLayer<F> {
	sink: Arc<F>,
}
impl<F> RecordStatusLayer<F>
where
	F: 'static + Send + Sync + Fn(&StatusRecord),
{
	/// Creates a layer reporting to `sink`.
	pub fn new(sink: F) -> Self {
		Self { sink: Arc::new(sink) }
	}
}
impl<F> Clone for RecordStatusLayer<F> {
	fn clone(&self) -> Self {
		Self { sink: self.sink.clone() }
	}
}
impl<F> Debug for RecordStatusLayer<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RecordStatusLayer(..)")
	}
}
impl<S, F> Layer<S> for RecordStatusLayer<F> {
	type Service = RecordStatus<S, F>;

	fn layer(&self, inner: S) -> Self::Service {
		RecordStatus { inner, sink: self.sink.clone() }
	}
}

/// Service decorator that forwards every call and records the answered status.
///
/// The request reaches the inner service untouched, extensions included, so the upgrade handle
/// a server stores there stays available to websocket and other upgrade handlers; the `101`
/// response is likewise returned as-is.
pub struct RecordStatus<S, F> {
	inner: S,
	sink: Arc<F>,
}
impl<S, F> Clone for RecordStatus<S, F>
where
	S: Clone,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), sink: self.sink.clone() }
	}
}
impl<S, F> Debug for RecordStatus<S, F>
where
	S: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RecordStatus").field("inner", &self.inner).finish_non_exhaustive()
	}
}
impl<S, F> Service<Request> for RecordStatus<S, F>
where
	S: 'static + Send + Service<Request, Response = Response>,
	S::Future: 'static + Send,
	F: 'static + Send + Sync + Fn(&StatusRecord),
{
	type Error = S::Error;
	type Future = RecordFuture<S::Error>;
	type Response = Response;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request) -> Self::Future {
		let method = request.method().clone();
		let uri = request.uri().clone();
		let upgrade = requested_upgrade(request.headers());
		let sink = self.sink.clone();
		let future = self.inner.call(request);

		Box::pin(async move {
			let response = future.await?;
			let status = response.status();
			let outcome =
				if status.is_server_error() { OpOutcome::Failure } else { OpOutcome::Success };

			obs::record_op_outcome(OpKind::Http, outcome);
			obs::record_response_status(status);
			sink(&StatusRecord { method, uri, status, upgrade });

			Ok(response)
		})
	}
}

fn requested_upgrade(headers: &HeaderMap) -> Option<String> {
	let wants_upgrade = headers
		.get_all(header::CONNECTION)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(','))
		.any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

	if !wants_upgrade {
		return None;
	}

	headers.get(header::UPGRADE)?.to_str().ok().map(|protocol| protocol.trim().to_owned())
}
