//! Audience predicates deciding which tokens a protected resource accepts.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::IgnoredAny;
// self
use crate::{_prelude::*, auth::Token};

/// Decides whether a parsed token grants access to a protected resource.
///
/// Implementations must be cheap and side-effect free: the gate calls them once per request and
/// never caches the answer. Any `Fn(&Token) -> bool` closure is an audience.
pub trait Audience
where
	Self: Send + Sync,
{
	/// Returns `true` if the token is acceptable.
	fn is_valid(&self, token: &Token) -> bool;
}
impl<F> Audience for F
where
	F: Send + Sync + Fn(&Token) -> bool,
{
	fn is_valid(&self, token: &Token) -> bool {
		self(token)
	}
}

/// HS256 audience: verifies the signature with a shared secret, requires `aud` to contain the
/// audience name, and enforces `exp` (required) and `nbf` (when present) with a clock leeway.
#[derive(Clone)]
pub struct HmacAudience {
	name: String,
	key: DecodingKey,
	validation: Validation,
}
impl HmacAudience {
	/// Clock skew tolerated on `exp`/`nbf` unless overridden.
	pub const DEFAULT_LEEWAY: Duration = Duration::seconds(30);

	/// Creates an audience named `name` whose tokens are signed with `secret`.
	pub fn new(name: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
		let name = name.into();
		let mut validation = Validation::new(Algorithm::HS256);

		validation.set_audience(&[name.as_str()]);
		validation.validate_nbf = true;
		validation.required_spec_claims =
			["exp", "aud"].into_iter().map(str::to_owned).collect();

		let audience = Self { name, key: DecodingKey::from_secret(secret.as_ref()), validation };

		audience.with_leeway(Self::DEFAULT_LEEWAY)
	}

	/// Overrides the clock leeway; negative values are treated as zero.
	pub fn with_leeway(mut self, leeway: Duration) -> Self {
		self.validation.leeway = u64::try_from(leeway.whole_seconds()).unwrap_or(0);

		self
	}

	/// Audience name matched against the `aud` claim.
	pub fn name(&self) -> &str {
		&self.name
	}
}
impl Debug for HmacAudience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HmacAudience")
			.field("name", &self.name)
			.field("key", &"<redacted>")
			.field("leeway", &self.validation.leeway)
			.finish()
	}
}
impl Audience for HmacAudience {
	fn is_valid(&self, token: &Token) -> bool {
		jsonwebtoken::decode::<IgnoredAny>(token.raw(), &self.key, &self.validation).is_ok()
	}
}
