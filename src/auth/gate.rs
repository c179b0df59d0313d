//! Cookie token gate: extract, parse, validate, then forward or reject.
//!
//! [`AuthGate::authenticate`] classifies every failure into an [`AuthRejection`] whose status and
//! message are fixed: a missing cookie, an unparseable token, and a token the audience refuses
//! all answer 401 with distinct messages, while a carrier that cannot be read at all answers 500
//! with the default message. Nothing is cached; each request is validated on its own.

// crates.io
use axum::{
	http::{Extensions, HeaderMap, Request, StatusCode},
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	auth::{Audience, Token},
	error::CredentialError,
	http::{self, ApiError},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const KIND: OpKind = OpKind::Auth;

/// Reason a request was refused by the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
pub enum AuthRejection {
	/// The named cookie was not sent.
	#[error("Credential is not present.")]
	CredentialAbsent,
	/// The cookie value is not a structurally valid token.
	#[error("Credential could not be parsed.")]
	CredentialMalformed,
	/// The cookie carrier could not be read.
	#[error("Credential carrier could not be read.")]
	CredentialStoreFailure,
	/// The audience refused the token.
	#[error("Credential is not valid for this audience.")]
	CredentialInvalidForAudience,
}
impl AuthRejection {
	/// HTTP status answered for this rejection.
	pub const fn status(self) -> StatusCode {
		match self {
			AuthRejection::CredentialStoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::UNAUTHORIZED,
		}
	}

	/// Response body; empty means the default message for [`status`](Self::status).
	pub const fn message(self) -> &'static str {
		match self {
			AuthRejection::CredentialAbsent => "credential not present",
			AuthRejection::CredentialMalformed => "could not parse credential",
			AuthRejection::CredentialStoreFailure => "",
			AuthRejection::CredentialInvalidForAudience => "invalid credential",
		}
	}

	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthRejection::CredentialAbsent => "absent",
			AuthRejection::CredentialMalformed => "malformed",
			AuthRejection::CredentialStoreFailure => "store_failure",
			AuthRejection::CredentialInvalidForAudience => "invalid_audience",
		}
	}
}
impl From<CredentialError> for AuthRejection {
	fn from(e: CredentialError) -> Self {
		match e {
			CredentialError::Absent { .. } => Self::CredentialAbsent,
			CredentialError::Malformed(_) => Self::CredentialMalformed,
			CredentialError::Unreadable { .. } => Self::CredentialStoreFailure,
		}
	}
}
impl From<AuthRejection> for ApiError {
	fn from(rejection: AuthRejection) -> Self {
		ApiError::new(rejection.status(), rejection.message())
	}
}
impl IntoResponse for AuthRejection {
	fn into_response(self) -> Response {
		ApiError::from(self).into_response()
	}
}

/// What the gate decided for a request.
#[derive(Debug)]
pub enum GateOutcome<B> {
	/// Pass the request on; its extensions now carry the parsed token.
	Forward(Request<B>),
	/// Answer with the rejection instead of calling the handler.
	Reject(AuthRejection),
}

/// Tokens accepted for the current request, keyed by cookie name.
///
/// Stored in request extensions by [`AuthGate::check`]; several gates on one route each add
/// their own entry.
#[derive(Clone, Debug, Default)]
pub struct AuthenticatedTokens(HashMap<String, Token>);
impl AuthenticatedTokens {
	/// Returns the token accepted from `cookie`, if any.
	pub fn get(&self, cookie: &str) -> Option<&Token> {
		self.0.get(cookie)
	}

	/// Looks up the token accepted from `cookie` in request extensions.
	pub fn from_extensions<'a>(extensions: &'a Extensions, cookie: &str) -> Option<&'a Token> {
		extensions.get::<Self>().and_then(|tokens| tokens.get(cookie))
	}

	/// Number of accepted tokens.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no token has been accepted.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	fn insert(&mut self, cookie: &str, token: Token) {
		self.0.insert(cookie.to_owned(), token);
	}
}

/// Validates the token carried by one named cookie against one audience.
#[derive(Clone)]
pub struct AuthGate {
	cookie: Arc<str>,
	audience: Arc<dyn Audience>,
}
impl AuthGate {
	/// Creates a gate reading `cookie` and accepting tokens `audience` approves.
	pub fn new(cookie: impl Into<Arc<str>>, audience: impl 'static + Audience) -> Self {
		Self { cookie: cookie.into(), audience: Arc::new(audience) }
	}

	/// Cookie the gate reads.
	pub fn cookie(&self) -> &str {
		&self.cookie
	}

	/// Extracts, parses, and validates the credential found in `headers`.
	pub fn authenticate(&self, headers: &HeaderMap) -> Result<Token, AuthRejection> {
		let _span = OpSpan::new(KIND, "authenticate").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = http::token_from_cookie(headers, &self.cookie)
			.map_err(AuthRejection::from)
			.and_then(|token| {
				if self.audience.is_valid(&token) {
					Ok(token)
				} else {
					Err(AuthRejection::CredentialInvalidForAudience)
				}
			});

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(rejection) => {
				obs::log_auth_rejection(&self.cookie, rejection.as_str());
				obs::record_op_outcome(KIND, OpOutcome::Rejected);
			},
		}

		result
	}

	/// Runs [`authenticate`](Self::authenticate) and, on success, attaches the token to the
	/// request's [`AuthenticatedTokens`] under this gate's cookie name.
	pub fn check<B>(&self, mut request: Request<B>) -> GateOutcome<B> {
		let token = match self.authenticate(request.headers()) {
			Ok(token) => token,
			Err(rejection) => return GateOutcome::Reject(rejection),
		};
		let extensions = request.extensions_mut();

		if let Some(tokens) = extensions.get_mut::<AuthenticatedTokens>() {
			tokens.insert(&self.cookie, token);
		} else {
			let mut tokens = AuthenticatedTokens::default();

			tokens.insert(&self.cookie, token);
			extensions.insert(tokens);
		}

		GateOutcome::Forward(request)
	}
}
impl Debug for AuthGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthGate").field("cookie", &self.cookie).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::{
		body,
		http::{
			HeaderValue,
			header::{CONTENT_TYPE, COOKIE},
		},
	};
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use super::*;

	fn compact(claims: &str) -> String {
		format!(
			"{}.{}.{}",
			URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
			URL_SAFE_NO_PAD.encode(claims),
			URL_SAFE_NO_PAD.encode("sig"),
		)
	}

	fn gate() -> AuthGate {
		AuthGate::new("access_token", |token: &Token| token.subject() == Some("user-1"))
	}

	fn request_with_cookie(cookie: &str) -> Request<()> {
		Request::builder()
			.uri("/private")
			.header(COOKIE, cookie)
			.body(())
			.expect("Test request should build.")
	}

	#[test]
	fn missing_cookie_is_rejected_as_absent() {
		let rejection = gate()
			.authenticate(&HeaderMap::new())
			.expect_err("Requests without the cookie must be rejected.");

		assert_eq!(rejection, AuthRejection::CredentialAbsent);
		assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(rejection.message(), "credential not present");
	}

	#[test]
	fn malformed_cookie_is_rejected_as_unparseable() {
		let request = request_with_cookie("access_token=not-a-token");
		let rejection = gate()
			.authenticate(request.headers())
			.expect_err("Malformed tokens must be rejected.");

		assert_eq!(rejection, AuthRejection::CredentialMalformed);
		assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(rejection.message(), "could not parse credential");
	}

	#[test]
	fn undecodable_token_cookie_is_a_server_error() {
		let mut headers = HeaderMap::new();

		headers.insert(
			COOKIE,
			HeaderValue::from_bytes(b"access_token=\xff").expect("Opaque bytes are a valid header."),
		);

		let rejection =
			gate().authenticate(&headers).expect_err("Unreadable carriers must be rejected.");

		assert_eq!(rejection, AuthRejection::CredentialStoreFailure);
		assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(rejection.message(), "");
	}

	#[test]
	fn audience_refusal_is_rejected_as_invalid() {
		let request =
			request_with_cookie(&format!("access_token={}", compact(r#"{"sub":"user-2"}"#)));
		let rejection = gate()
			.authenticate(request.headers())
			.expect_err("Tokens refused by the audience must be rejected.");

		assert_eq!(rejection, AuthRejection::CredentialInvalidForAudience);
		assert_eq!(rejection.message(), "invalid credential");
	}

	#[test]
	fn accepted_token_is_attached_under_cookie_name() {
		let raw = compact(r#"{"sub":"user-1"}"#);
		let request = request_with_cookie(&format!("theme=dark; access_token={raw}"));
		let GateOutcome::Forward(request) = gate().check(request) else {
			panic!("Valid tokens should be forwarded.");
		};
		let token = AuthenticatedTokens::from_extensions(request.extensions(), "access_token")
			.expect("Forwarded requests should carry the accepted token.");

		assert_eq!(token.raw(), raw);
		assert_eq!(request.uri().path(), "/private");
	}

	#[test]
	fn gates_stack_their_tokens() {
		let api_gate = AuthGate::new("api_token", |_: &Token| true);
		let cookie = format!(
			"access_token={}; api_token={}",
			compact(r#"{"sub":"user-1"}"#),
			compact(r#"{"sub":"bot"}"#)
		);
		let GateOutcome::Forward(request) = gate().check(request_with_cookie(&cookie)) else {
			panic!("Access token should be accepted.");
		};
		let GateOutcome::Forward(request) = api_gate.check(request) else {
			panic!("API token should be accepted.");
		};
		let tokens = request
			.extensions()
			.get::<AuthenticatedTokens>()
			.expect("Both gates should share one token map.");

		assert_eq!(tokens.len(), 2);
		assert_eq!(tokens.get("api_token").and_then(Token::subject), Some("bot"));
	}

	#[test]
	fn undecodable_neighbour_cookie_does_not_hide_the_token() {
		let raw = compact(r#"{"sub":"user-1"}"#);
		let mut headers = HeaderMap::new();

		headers.insert(
			COOKIE,
			HeaderValue::from_bytes(format!("name=José; access_token={raw}").as_bytes())
				.expect("UTF-8 cookie values are a valid header."),
		);
		headers.append(
			COOKIE,
			HeaderValue::from_bytes(b"legacy=caf\xe9").expect("Opaque bytes are a valid header."),
		);

		let token = gate()
			.authenticate(&headers)
			.expect("A readable token next to a non-ASCII cookie should be accepted.");

		assert_eq!(token.raw(), raw);
	}

	#[tokio::test]
	async fn store_failure_renders_default_message() {
		let response = AuthRejection::CredentialStoreFailure.into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

		let body = body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Rejection body should be readable.");

		assert_eq!(&body[..], b"internal server error\n");
	}
}
