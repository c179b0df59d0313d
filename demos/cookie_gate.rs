//! Demonstrates a cookie-gated `axum` router with the access-log layer, then a flaky upstream
//! call wrapped in exponential-backoff retries.

// crates.io
use axum::{
	Extension, Router,
	body::{self, Body},
	http::{HeaderValue, Request, header::COOKIE},
	routing::get,
};
use color_eyre::Result;
use httpmock::prelude::*;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
// self
use apikit::{
	AuthGate, HmacAudience, RetryPolicy,
	auth::AuthenticatedTokens,
	http::ACCESS_TOKEN_COOKIE,
	middleware::{RequireTokenLayer, log_layer},
	retry_async,
};

const SECRET: &[u8] = b"demo-secret";

async fn profile(Extension(tokens): Extension<AuthenticatedTokens>) -> String {
	let subject = tokens.get(ACCESS_TOKEN_COOKIE).and_then(|token| token.subject());

	format!("Hello, {}.", subject.unwrap_or("stranger"))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let gate = AuthGate::new(ACCESS_TOKEN_COOKIE, HmacAudience::new("profile-api", SECRET));
	let app = Router::new()
		.route("/profile", get(profile))
		.route_layer(RequireTokenLayer::new(gate))
		.layer(log_layer());
	let claims = json!({
		"sub": "ada",
		"aud": "profile-api",
		"exp": (OffsetDateTime::now_utc() + Duration::minutes(5)).unix_timestamp(),
	});
	let token = jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))?;

	for cookie in [None, Some(format!("{ACCESS_TOKEN_COOKIE}={token}"))] {
		let mut request = Request::get("/profile").body(Body::empty())?;

		if let Some(cookie) = cookie {
			request.headers_mut().insert(COOKIE, HeaderValue::from_str(&cookie)?);
		}

		let response = app.clone().oneshot(request).await?;
		let status = response.status();
		let body = body::to_bytes(response.into_body(), usize::MAX).await?;

		println!("{status}: {}", String::from_utf8_lossy(&body).trim_end());
	}

	let server = MockServer::start_async().await;
	let upstream = server
		.mock_async(|when, then| {
			when.method(GET).path("/inventory");
			then.status(503);
		})
		.await;
	let policy = RetryPolicy::builder()
		.max_attempts(3)
		.initial_delay(Duration::milliseconds(100))
		.build()?;
	let client = &reqwest::Client::new();
	let url = &server.url("/inventory");
	let outcome = retry_async(&policy, || async move {
		let response = client.get(url).send().await.map_err(|e| e.to_string())?;

		if response.status().is_success() {
			Ok(())
		} else {
			Err(format!("inventory answered {}", response.status()))
		}
	})
	.await;

	match outcome {
		Ok(()) => println!("Inventory is up."),
		Err(e) => println!("Gave up after {} attempts: {e}.", policy.max_attempts()),
	}

	upstream.assert_calls_async(3).await;

	Ok(())
}
