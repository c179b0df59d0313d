//! Crate-level error types shared by the retry, cookie, and auth helpers.

// std
use std::str::Utf8Error;
// crates.io
use axum::http::header::InvalidHeaderValue;
// self
use crate::{_prelude::*, auth::ParseError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Cookie lookup failure.
	#[error(transparent)]
	Cookie(#[from] CookieError),
	/// Credential extraction or parsing failure.
	#[error(transparent)]
	Credential(#[from] CredentialError),
}

/// Configuration and validation failures raised while building helpers.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Retry policies must allow at least one attempt.
	#[error("Retry policy must allow at least one attempt.")]
	ZeroAttempts,
	/// Backoff parameters cannot produce a sane delay sequence.
	#[error("Retry backoff is invalid: {reason}.")]
	InvalidBackoff {
		/// Which parameter was rejected.
		reason: &'static str,
	},
	/// Credentialed cross-origin responses cannot use the wildcard origin.
	#[error("Access-Control-Allow-Origin cannot be `*` when credentials are included.")]
	WildcardOrigin,
	/// Origin string cannot be parsed as a URL.
	#[error("Origin `{origin}` is invalid.")]
	InvalidOrigin {
		/// Offending origin string.
		origin: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// String parses as a URL but is not a bare `scheme://host[:port]` origin.
	#[error("`{origin}` is not a bare scheme://host[:port] origin.")]
	NotAnOrigin {
		/// Offending origin string.
		origin: String,
	},
	/// A header value could not be encoded.
	#[error("Header `{name}` received an invalid value.")]
	InvalidHeaderValue {
		/// Header name being written.
		name: &'static str,
		/// Underlying encoding failure.
		#[source]
		source: InvalidHeaderValue,
	},
	/// The process-wide status message table was already installed.
	#[error("Status message table has already been installed.")]
	MessagesAlreadyInstalled,
}

/// Cookie lookup failures.
#[derive(Debug, ThisError)]
pub enum CookieError {
	/// No cookie with the requested name was sent.
	#[error("Cookie `{name}` is not present.")]
	NotFound {
		/// Requested cookie name.
		name: String,
	},
	/// The requested cookie was sent but its bytes are not UTF-8.
	#[error("Cookie `{name}` could not be decoded.")]
	Unreadable {
		/// Requested cookie name.
		name: String,
		/// Underlying decoding failure.
		#[source]
		source: Utf8Error,
	},
}

/// Failures raised while pulling a token out of a request.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// The named carrier was not present.
	#[error("Credential `{name}` is not present.")]
	Absent {
		/// Carrier name.
		name: String,
	},
	/// The credential was present but structurally invalid.
	#[error("Credential could not be parsed.")]
	Malformed(#[from] ParseError),
	/// The carrier could not be read for a reason unrelated to the credential itself.
	#[error("Credential carrier could not be read.")]
	Unreadable {
		/// Underlying failure.
		#[source]
		source: Utf8Error,
	},
}
impl From<CookieError> for CredentialError {
	fn from(e: CookieError) -> Self {
		match e {
			CookieError::NotFound { name } => Self::Absent { name },
			CookieError::Unreadable { source, .. } => Self::Unreadable { source },
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_cookie_maps_to_absent_credential() {
		let err = CredentialError::from(CookieError::NotFound { name: "access_token".into() });

		assert!(matches!(err, CredentialError::Absent { ref name } if name == "access_token"));
		assert_eq!(err.to_string(), "Credential `access_token` is not present.");
	}

	#[test]
	fn parse_error_is_exposed_as_source() {
		let err: Error = CredentialError::from(ParseError::SegmentCount { found: 2 }).into();

		assert!(matches!(err, Error::Credential(CredentialError::Malformed(_))));

		let source = StdError::source(&err)
			.expect("Malformed credential errors should expose the parse error as their source.");

		assert_eq!(source.to_string(), "Token must have 3 segments, found 2.");
	}
}
