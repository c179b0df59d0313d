//! Plain-text error responses and the process-wide default message table.

// std
use std::{borrow::Cow, sync::OnceLock};
// crates.io
use axum::{
	http::{
		HeaderValue, StatusCode,
		header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
	},
	response::{IntoResponse, Response},
};
// self
use crate::{_prelude::*, error::ConfigError};

static MESSAGES: OnceLock<StatusMessages> = OnceLock::new();

/// Messages used when an error response is written with an empty message.
///
/// The table is installed at most once per process, before the first response is rendered; after
/// that it is read-only. Statuses missing from the table fall back to their lowercase canonical
/// reason phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessages(HashMap<StatusCode, Cow<'static, str>>);
impl StatusMessages {
	/// Table with no entries; every status uses its canonical reason phrase.
	pub fn empty() -> Self {
		Self(HashMap::new())
	}

	/// Adds or replaces the message for `status`.
	pub fn with(mut self, status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
		self.0.insert(status, message.into());

		self
	}

	/// Message for `status`.
	pub fn message_for(&self, status: StatusCode) -> Cow<'static, str> {
		if let Some(message) = self.0.get(&status) {
			return message.clone();
		}

		match status.canonical_reason() {
			Some(reason) => Cow::Owned(reason.to_lowercase()),
			None => Cow::Owned(status.as_str().to_owned()),
		}
	}

	/// Installs this table for the whole process.
	///
	/// Fails once a table is in place, including the default one that the first error response
	/// installs implicitly.
	pub fn install(self) -> Result<(), ConfigError> {
		MESSAGES.set(self).map_err(|_| ConfigError::MessagesAlreadyInstalled)
	}

	/// Table in effect for this process.
	pub fn global() -> &'static StatusMessages {
		MESSAGES.get_or_init(StatusMessages::default)
	}
}
impl Default for StatusMessages {
	fn default() -> Self {
		Self::empty()
			.with(StatusCode::UNAUTHORIZED, "unauthorized")
			.with(StatusCode::BAD_REQUEST, "bad request")
			.with(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
			.with(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
	}
}

/// Default message for `status` from the process-wide table.
pub fn default_message(status: StatusCode) -> Cow<'static, str> {
	StatusMessages::global().message_for(status)
}

/// Builds a plain-text error response; an empty `message` is replaced by the default message for
/// `status`.
pub fn error_response(message: &str, status: StatusCode) -> Response {
	let message = if message.is_empty() { default_message(status) } else { Cow::Borrowed(message) };
	let mut response = (status, format!("{message}\n")).into_response();
	let headers = response.headers_mut();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
	headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

	response
}

/// Status plus message, rendered through [`error_response`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{status}: {message}")]
pub struct ApiError {
	/// HTTP status to answer with.
	pub status: StatusCode,
	/// Body text; empty means the default message.
	pub message: Cow<'static, str>,
}
impl ApiError {
	/// Creates an error with an explicit message.
	pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
		Self { status, message: message.into() }
	}

	/// 401 with the default message.
	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED, "")
	}

	/// 400 with the default message.
	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST, "")
	}

	/// 500 with the default message.
	pub fn internal() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR, "")
	}

	/// 405 with the default message.
	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED, "")
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		error_response(&self.message, self.status)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::body;
	// self
	use super::*;

	async fn body_text(response: Response) -> String {
		let bytes = body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Error response body should be readable.");

		String::from_utf8(bytes.to_vec()).expect("Error response body should be UTF-8.")
	}

	#[test]
	fn default_table_covers_common_statuses() {
		let table = StatusMessages::default();

		assert_eq!(table.message_for(StatusCode::UNAUTHORIZED), "unauthorized");
		assert_eq!(table.message_for(StatusCode::BAD_REQUEST), "bad request");
		assert_eq!(table.message_for(StatusCode::INTERNAL_SERVER_ERROR), "internal server error");
		assert_eq!(table.message_for(StatusCode::METHOD_NOT_ALLOWED), "method not allowed");
		assert_eq!(table.message_for(StatusCode::FORBIDDEN), "forbidden");
		assert_eq!(
			table.message_for(StatusCode::from_u16(599).expect("599 is a valid status code.")),
			"599"
		);
	}

	#[test]
	fn install_fails_once_a_table_is_in_place() {
		let _ = StatusMessages::global();

		assert!(matches!(
			StatusMessages::empty().install(),
			Err(ConfigError::MessagesAlreadyInstalled)
		));
	}

	#[tokio::test]
	async fn error_response_writes_plain_text_body() {
		let response = error_response("token expired", StatusCode::UNAUTHORIZED);

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
		assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
		assert_eq!(body_text(response).await, "token expired\n");
	}

	#[tokio::test]
	async fn empty_message_falls_back_to_default() {
		let response = ApiError::method_not_allowed().into_response();

		assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(body_text(response).await, "method not allowed\n");
	}
}
