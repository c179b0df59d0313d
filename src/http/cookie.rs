//! Cookie helpers: HttpOnly and credentialed cross-origin `Set-Cookie`, lookup, and removal.

// std
use std::str;
// crates.io
use axum::http::{
	HeaderMap, HeaderValue,
	header::{
		ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, COOKIE, SET_COOKIE,
	},
};
use cookie::Cookie;
// self
use crate::{
	_prelude::*,
	auth::Token,
	error::{ConfigError, CookieError, CredentialError},
};

/// Cookie carrying the long-lived refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Cookie carrying the short-lived access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie carrying a service API token.
pub const API_TOKEN_COOKIE: &str = "api_token";

/// Appends an HttpOnly `Set-Cookie` header.
pub fn set_http_only_cookie(
	headers: &mut HeaderMap,
	name: &str,
	value: &str,
	max_age: Duration,
) -> Result<(), ConfigError> {
	let cookie = Cookie::build((name.to_owned(), value.to_owned()))
		.http_only(true)
		.max_age(max_age)
		.build();

	append_set_cookie(headers, &cookie)
}

/// Appends an HttpOnly `Set-Cookie` header that a browser accepts from a credentialed
/// cross-origin request.
///
/// Browsers refuse credentialed responses whose `Access-Control-Allow-Origin` is `*`, so the
/// origin is echoed exactly (in its serialized `scheme://host[:port]` form) alongside
/// `Access-Control-Allow-Credentials: true`. Wildcards and strings that are not origins are
/// rejected before any header is written.
pub fn set_cross_origin_cookie(
	headers: &mut HeaderMap,
	name: &str,
	value: &str,
	max_age: Duration,
	origin: &str,
) -> Result<(), ConfigError> {
	let origin = allowed_origin(origin)?;

	set_http_only_cookie(headers, name, value, max_age)?;
	headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
	headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));

	Ok(())
}

/// Returns the value of the first cookie named `name` across all `Cookie` headers.
///
/// Pairs are split on raw bytes, so other cookies carrying non-ASCII or malformed values are
/// skipped. Only the requested cookie failing to decode as UTF-8 fails the lookup.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Result<String, CookieError> {
	let pairs =
		headers.get_all(COOKIE).iter().flat_map(|value| value.as_bytes().split(|b| *b == b';'));

	for pair in pairs {
		let Some(eq) = pair.iter().position(|b| *b == b'=') else {
			continue;
		};

		if pair[..eq].trim_ascii() != name.as_bytes() {
			continue;
		}

		let pair = str::from_utf8(pair)
			.map_err(|source| CookieError::Unreadable { name: name.to_owned(), source })?;

		if let Ok(cookie) = Cookie::parse(pair) {
			return Ok(cookie.value().to_owned());
		}
	}

	Err(CookieError::NotFound { name: name.to_owned() })
}

/// Appends a `Set-Cookie` header that clears `name` (empty value, `Max-Age=0`).
pub fn delete_cookie(headers: &mut HeaderMap, name: &str) -> Result<(), ConfigError> {
	let cookie = Cookie::build((name.to_owned(), String::new())).max_age(Duration::ZERO).build();

	append_set_cookie(headers, &cookie)
}

/// Reads the cookie named `name` and parses it as a [`Token`].
pub fn token_from_cookie(headers: &HeaderMap, name: &str) -> Result<Token, CredentialError> {
	let raw = get_cookie(headers, name)?;

	Ok(raw.parse::<Token>()?)
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) -> Result<(), ConfigError> {
	let value = HeaderValue::from_str(&cookie.to_string())
		.map_err(|source| ConfigError::InvalidHeaderValue { name: "set-cookie", source })?;

	headers.append(SET_COOKIE, value);

	Ok(())
}

fn allowed_origin(origin: &str) -> Result<HeaderValue, ConfigError> {
	if origin.trim() == "*" {
		return Err(ConfigError::WildcardOrigin);
	}

	let url = Url::parse(origin)
		.map_err(|source| ConfigError::InvalidOrigin { origin: origin.to_owned(), source })?;
	let serialized = url.origin().ascii_serialization();
	let bare = matches!(url.path(), "" | "/") && url.query().is_none() && url.fragment().is_none();

	if !url.origin().is_tuple() || !bare {
		return Err(ConfigError::NotAnOrigin { origin: origin.to_owned() });
	}

	HeaderValue::from_str(&serialized).map_err(|source| ConfigError::InvalidHeaderValue {
		name: "access-control-allow-origin",
		source,
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn set_cookie_values(headers: &HeaderMap) -> Vec<&str> {
		headers
			.get_all(SET_COOKIE)
			.iter()
			.map(|value| value.to_str().expect("Set-Cookie values should be ASCII."))
			.collect()
	}

	#[test]
	fn http_only_cookie_carries_max_age() {
		let mut headers = HeaderMap::new();

		set_http_only_cookie(&mut headers, ACCESS_TOKEN_COOKIE, "abc.def.ghi", Duration::hours(1))
			.expect("Plain cookie values should be accepted.");

		let values = set_cookie_values(&headers);

		assert_eq!(values.len(), 1);
		assert!(values[0].starts_with("access_token=abc.def.ghi"));
		assert!(values[0].contains("HttpOnly"));
		assert!(values[0].contains("Max-Age=3600"));
		assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
	}

	#[test]
	fn cross_origin_cookie_echoes_exact_origin() {
		let mut headers = HeaderMap::new();

		set_cross_origin_cookie(
			&mut headers,
			REFRESH_TOKEN_COOKIE,
			"refresh",
			Duration::days(30),
			"https://app.example.com",
		)
		.expect("A bare HTTPS origin should be accepted.");

		assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
		assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
		assert!(set_cookie_values(&headers)[0].starts_with("refresh_token=refresh"));
	}

	#[test]
	fn cross_origin_cookie_rejects_wildcards_and_non_origins() {
		let mut headers = HeaderMap::new();
		let err = set_cross_origin_cookie(&mut headers, "c", "v", Duration::MINUTE, "*")
			.expect_err("Wildcard origins must be rejected.");

		assert!(matches!(err, ConfigError::WildcardOrigin));

		let err = set_cross_origin_cookie(&mut headers, "c", "v", Duration::MINUTE, "app.example")
			.expect_err("Origins without a scheme must be rejected.");

		assert!(matches!(err, ConfigError::InvalidOrigin { .. }));

		let err = set_cross_origin_cookie(
			&mut headers,
			"c",
			"v",
			Duration::MINUTE,
			"https://app.example.com/login",
		)
		.expect_err("Origins with a path must be rejected.");

		assert!(matches!(err, ConfigError::NotAnOrigin { .. }));
		assert!(headers.is_empty(), "Rejected origins must not leave headers behind.");
	}

	#[test]
	fn get_cookie_scans_every_cookie_header() {
		let mut headers = HeaderMap::new();

		headers.append(COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
		headers.append(COOKIE, HeaderValue::from_static("api_token=xyz"));

		assert_eq!(get_cookie(&headers, "lang").expect("lang should be found."), "en");
		assert_eq!(
			get_cookie(&headers, API_TOKEN_COOKIE).expect("api_token should be found."),
			"xyz"
		);
		assert!(matches!(
			get_cookie(&headers, "missing"),
			Err(CookieError::NotFound { name }) if name == "missing"
		));
	}

	#[test]
	fn get_cookie_skips_undecodable_neighbours() {
		let mut headers = HeaderMap::new();

		headers.append(
			COOKIE,
			HeaderValue::from_bytes(b"theme=\xff; name=Jos\xc3\xa9; lang=en")
				.expect("Opaque bytes are a valid header value."),
		);
		headers.append(
			COOKIE,
			HeaderValue::from_bytes(b"legacy=caf\xe9; api_token=xyz")
				.expect("Opaque bytes are a valid header value."),
		);

		assert_eq!(get_cookie(&headers, "name").expect("UTF-8 values should be read."), "José");
		assert_eq!(get_cookie(&headers, "lang").expect("lang should be found."), "en");
		assert_eq!(
			get_cookie(&headers, API_TOKEN_COOKIE).expect("api_token should be found."),
			"xyz"
		);
		assert!(matches!(
			get_cookie(&headers, "legacy"),
			Err(CookieError::Unreadable { name, .. }) if name == "legacy"
		));
	}

	#[test]
	fn delete_cookie_expires_immediately() {
		let mut headers = HeaderMap::new();

		delete_cookie(&mut headers, ACCESS_TOKEN_COOKIE)
			.expect("Deleting a cookie should always encode.");

		let values = set_cookie_values(&headers);

		assert!(values[0].starts_with("access_token=;"));
		assert!(values[0].contains("Max-Age=0"));
	}

	#[test]
	fn control_characters_are_rejected() {
		let mut headers = HeaderMap::new();
		let err = set_http_only_cookie(&mut headers, "c", "line\nbreak", Duration::MINUTE)
			.expect_err("Control characters cannot be sent in headers.");

		assert!(matches!(err, ConfigError::InvalidHeaderValue { name: "set-cookie", .. }));
	}

	#[test]
	fn token_from_cookie_classifies_failures() {
		let mut headers = HeaderMap::new();

		assert!(matches!(
			token_from_cookie(&headers, ACCESS_TOKEN_COOKIE),
			Err(CredentialError::Absent { .. })
		));

		headers.insert(COOKIE, HeaderValue::from_static("access_token=garbage"));

		assert!(matches!(
			token_from_cookie(&headers, ACCESS_TOKEN_COOKIE),
			Err(CredentialError::Malformed(_))
		));
	}
}
