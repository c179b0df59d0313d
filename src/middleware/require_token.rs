//! Token gate as a `tower` layer and as an `axum::middleware::from_fn_with_state` function.

// std
use std::task::{Context, Poll};
// crates.io
use axum::{
	extract::{Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
use tower::{Layer, Service};
// self
use crate::{
	_prelude::*,
	auth::{AuthGate, GateOutcome},
};

type GateFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

/// Layer that runs an [`AuthGate`] in front of the wrapped service.
#[derive(Clone, Debug)]
pub struct RequireTokenLayer {
	gate: AuthGate,
}
impl RequireTokenLayer {
	/// Wraps services with `gate`.
	pub fn new(gate: AuthGate) -> Self {
		Self { gate }
	}
}
impl<S> Layer<S> for RequireTokenLayer {
	type Service = RequireToken<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RequireToken { inner, gate: self.gate.clone() }
	}
}

/// Service produced by [`RequireTokenLayer`].
///
/// Rejected requests are answered directly and never reach the inner service.
#[derive(Clone, Debug)]
pub struct RequireToken<S> {
	inner: S,
	gate: AuthGate,
}
impl<S> Service<Request> for RequireToken<S>
where
	S: 'static + Send + Service<Request, Response = Response>,
	S::Future: 'static + Send,
{
	type Error = S::Error;
	type Future = GateFuture<S::Error>;
	type Response = Response;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request) -> Self::Future {
		match self.gate.check(request) {
			GateOutcome::Forward(request) => Box::pin(self.inner.call(request)),
			GateOutcome::Reject(rejection) => {
				let response = rejection.into_response();

				Box::pin(async move { Ok(response) })
			},
		}
	}
}

/// `axum` middleware function running `gate` before `next`.
///
/// ```no_run
/// use apikit::{AuthGate, Token, middleware::require_token};
/// use axum::{Router, middleware, routing::get};
///
/// let gate = AuthGate::new("access_token", |_: &Token| true);
/// let app: Router = Router::new()
/// 	.route("/me", get(|| async { "ok" }))
/// 	.route_layer(middleware::from_fn_with_state(gate, require_token));
/// ```
pub async fn require_token(State(gate): State<AuthGate>, request: Request, next: Next) -> Response {
	match gate.check(request) {
		GateOutcome::Forward(request) => next.run(request).await,
		GateOutcome::Reject(rejection) => rejection.into_response(),
	}
}
