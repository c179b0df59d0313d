//! Structural parsing of compact JWS tokens carried by cookies.
//!
//! Parsing only checks shape: three base64url segments, a JSON header naming an algorithm, and a
//! JSON object of claims. Signatures, audiences, and expiry are the business of an
//! [`Audience`](crate::auth::Audience).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Token section named in parse errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
	/// JOSE header.
	Header,
	/// Claims payload.
	Claims,
	/// Signature bytes.
	Signature,
}
impl Segment {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Segment::Header => "header",
			Segment::Claims => "claims",
			Segment::Signature => "signature",
		}
	}
}
impl Display for Segment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Structural failures raised while parsing a compact token.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// The token did not split into header, claims, and signature.
	#[error("Token must have 3 segments, found {found}.")]
	SegmentCount {
		/// Number of `.`-separated segments found.
		found: usize,
	},
	/// One of the segments was empty.
	#[error("Token {segment} segment is empty.")]
	EmptySegment {
		/// Offending segment.
		segment: Segment,
	},
	/// A segment was not unpadded base64url.
	#[error("Token {segment} segment is not valid base64url.")]
	Base64 {
		/// Offending segment.
		segment: Segment,
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// A segment decoded to JSON that does not match the expected shape.
	#[error("Token {segment} segment is not valid JSON.")]
	Json {
		/// Offending segment.
		segment: Segment,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// JOSE header fields the crate understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
	/// Signing algorithm, e.g. `HS256`.
	pub alg: String,
	/// Media type, usually `JWT`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub typ: Option<String>,
	/// Key identifier hint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,
}

/// `aud` claim, which may be a single string or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudienceClaim {
	/// Single audience.
	One(String),
	/// Several audiences.
	Many(Vec<String>),
}
impl AudienceClaim {
	/// Returns `true` if `name` is one of the listed audiences.
	pub fn contains(&self, name: &str) -> bool {
		match self {
			AudienceClaim::One(value) => value == name,
			AudienceClaim::Many(values) => values.iter().any(|value| value == name),
		}
	}
}

/// Registered claims plus whatever else the issuer put in the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
	/// Subject.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Issuer.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Intended audience(s).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aud: Option<AudienceClaim>,
	/// Expiry as seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Not-before as seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nbf: Option<i64>,
	/// Issued-at as seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Private claims.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Claims {
	/// Expiry instant, if present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}

	/// Returns `true` if the token carries an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| expires_at <= instant)
	}
}

/// Parsed token. Cheap to clone; the compact form is kept for signature checks.
#[derive(Clone, PartialEq)]
pub struct Token {
	header: TokenHeader,
	claims: Claims,
	raw: String,
}
impl Token {
	/// Parses a compact token; equivalent to `raw.parse::<Token>()`.
	pub fn parse(raw: &str) -> Result<Self, ParseError> {
		raw.parse()
	}

	/// JOSE header.
	pub fn header(&self) -> &TokenHeader {
		&self.header
	}

	/// Claims payload.
	pub fn claims(&self) -> &Claims {
		&self.claims
	}

	/// Subject claim, if any.
	pub fn subject(&self) -> Option<&str> {
		self.claims.sub.as_deref()
	}

	/// Compact form. Callers must avoid logging this string.
	pub fn raw(&self) -> &str {
		&self.raw
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("header", &self.header)
			.field("claims", &self.claims)
			.field("raw", &"<redacted>")
			.finish()
	}
}
impl FromStr for Token {
	type Err = ParseError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let segments = raw.split('.').collect::<Vec<_>>();
		let [header, claims, signature] = segments.as_slice() else {
			return Err(ParseError::SegmentCount { found: segments.len() });
		};
		let header = decode_json::<TokenHeader>(Segment::Header, header)?;
		let claims = decode_json::<Claims>(Segment::Claims, claims)?;

		decode_bytes(Segment::Signature, signature)?;

		Ok(Self { header, claims, raw: raw.to_owned() })
	}
}

fn decode_bytes(segment: Segment, encoded: &str) -> Result<Vec<u8>, ParseError> {
	if encoded.is_empty() {
		return Err(ParseError::EmptySegment { segment });
	}

	URL_SAFE_NO_PAD.decode(encoded).map_err(|source| ParseError::Base64 { segment, source })
}

fn decode_json<T>(segment: Segment, encoded: &str) -> Result<T, ParseError>
where
	T: DeserializeOwned,
{
	let bytes = decode_bytes(segment, encoded)?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|source| ParseError::Json { segment, source })
}
